pub mod routines;
pub mod settings;
pub mod signal;

use std::io;

use colored::*;

use crate::core::routines::RoutineRunner;
use crate::core::settings::{settings_path, BenchmarkSettings};
use crate::stats::routine_report::{summary_table, write_csv};
use crate::stats::RoutineReport;
use crate::utils::helpers::{cpu_brand, os_description};

// ============================================================================
// BENCHMARK DRIVER
// ============================================================================

pub async fn run_benchmark() -> io::Result<()> {
    let settings = BenchmarkSettings::load(&settings_path())?;
    let reports = run_with_settings(&settings).await?;

    println!();
    println!("{}", "Summary".bold().yellow());
    println!("{}", summary_table(&reports));

    if let Some(path) = &settings.results_csv {
        write_csv(path, &reports)?;
        println!("{} {}", "Results saved to".green(), path.display());
    }

    Ok(())
}

/// Print the header and run every selected routine in order.
pub async fn run_with_settings(settings: &BenchmarkSettings) -> io::Result<Vec<RoutineReport>> {
    println!("OS: {}", os_description());
    println!("CPU: {}", cpu_brand().unwrap_or_else(|| "Unknown".to_string()));
    println!("Iterations count: {}", settings.iterations);
    println!();

    let runner = RoutineRunner::new(settings.iterations, settings.justify_width);
    let mut reports = Vec::with_capacity(settings.routines.len());
    for &routine in &settings.routines {
        reports.push(runner.run(routine).await?);
    }
    Ok(reports)
}
