//! Benchmark result collection and reporting.

pub mod routine_report;

pub use routine_report::{RoutineOutcome, RoutineReport};
