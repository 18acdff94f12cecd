//! Per-routine results: summary table and CSV export.

use std::io::{self, Error, ErrorKind};
use std::path::Path;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::core::routines::Routine;
use crate::timer::PlatformStatus;

/// How a routine ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineOutcome {
    Completed,
    /// A platform call failed before the timed loop could run.
    Aborted(PlatformStatus),
}

impl std::fmt::Display for RoutineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineOutcome::Completed => write!(f, "completed"),
            RoutineOutcome::Aborted(status) => write!(f, "aborted ({})", status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutineReport {
    pub routine: Routine,
    pub iterations: u32,
    pub elapsed: Duration,
    pub outcome: RoutineOutcome,
}

impl RoutineReport {
    /// Mean time per iteration in microseconds; zero for aborted routines.
    pub fn per_iteration_us(&self) -> f64 {
        if self.outcome != RoutineOutcome::Completed || self.iterations == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1e6 / self.iterations as f64
    }
}

#[derive(Serialize)]
struct CsvRecord<'a> {
    routine: &'a str,
    iterations: u32,
    elapsed_ms: f64,
    per_iteration_us: f64,
    outcome: String,
}

pub fn summary_table(reports: &[RoutineReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Routine", "Iterations", "Elapsed (ms)", "Per iteration (µs)", "Outcome"]);
    for report in reports {
        table.add_row(vec![
            report.routine.name().to_string(),
            report.iterations.to_string(),
            format!("{:.3}", report.elapsed.as_secs_f64() * 1e3),
            format!("{:.3}", report.per_iteration_us()),
            report.outcome.to_string(),
        ]);
    }
    table
}

pub fn write_csv<P: AsRef<Path>>(path: P, reports: &[RoutineReport]) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref()).map_err(|e| Error::new(ErrorKind::Other, e))?;
    for report in reports {
        writer
            .serialize(CsvRecord {
                routine: report.routine.name(),
                iterations: report.iterations,
                elapsed_ms: report.elapsed.as_secs_f64() * 1e3,
                per_iteration_us: report.per_iteration_us(),
                outcome: report.outcome.to_string(),
            })
            .map_err(|e| Error::new(ErrorKind::Other, e))?;
    }
    writer.flush()
}
