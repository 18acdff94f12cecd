//! High-resolution timer benchmark library
//!
//! Measures OS sleep granularity, the multimedia timer period and the kernel
//! timer-resolution/delay primitives.

pub mod core;
pub mod stats;
pub mod timer;
pub mod utils;

pub use crate::core::run_benchmark;
pub use timer::HiResTimer;
pub use utils::ScopedStopwatch;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
