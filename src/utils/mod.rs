//! Console-side utilities shared by the benchmark routines.

pub mod helpers;
pub mod stopwatch;

pub use stopwatch::ScopedStopwatch;
