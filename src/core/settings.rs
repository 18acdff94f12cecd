//! Benchmark settings loaded from `hirestimers.json`.

use std::io::{self, Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::core::routines::Routine;
use crate::utils::stopwatch::DEFAULT_JUSTIFY_WIDTH;

pub const DEFAULT_SETTINGS_FILE: &str = "hirestimers.json";
/// Overrides the settings file location.
pub const SETTINGS_PATH_ENV: &str = "HIRESTIMERS_CONFIG";
pub const DEFAULT_ITERATIONS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkSettings {
    #[serde(rename = "Iterations", deserialize_with = "validate_positive_u32")]
    pub iterations: u32,
    #[serde(rename = "Routines", deserialize_with = "validate_routines")]
    pub routines: Vec<Routine>,
    #[serde(rename = "JustifyWidth")]
    pub justify_width: usize,
    #[serde(rename = "ResultsCsv")]
    pub results_csv: Option<PathBuf>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            routines: Routine::default_selection(),
            justify_width: DEFAULT_JUSTIFY_WIDTH,
            results_csv: None,
        }
    }
}

fn validate_positive_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u32::deserialize(deserializer)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

fn validate_routines<'de, D>(deserializer: D) -> Result<Vec<Routine>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let routines = Vec::<Routine>::deserialize(deserializer)?;
    if routines.is_empty() {
        Err(serde::de::Error::custom("At least one routine must be selected"))
    } else {
        Ok(routines)
    }
}

impl BenchmarkSettings {
    pub fn from_json(content: &str) -> io::Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                log::info!("loading settings from {}", path.display());
                Self::from_json(&content).map_err(|e| {
                    Error::new(ErrorKind::InvalidData, format!("{}: {}", path.display(), e))
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("{} not found, using default settings", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }
}

/// Settings file location: `$HIRESTIMERS_CONFIG` or `hirestimers.json`.
pub fn settings_path() -> PathBuf {
    env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}
