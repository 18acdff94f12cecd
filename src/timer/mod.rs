//! Timer resolution primitives and scoped guards.

pub mod hi_res_timer;
pub mod period;
pub mod platform;

pub use hi_res_timer::HiResTimer;
pub use period::TimerPeriodGuard;
pub use platform::{NativeTimerPlatform, PlatformStatus, ResolutionBounds, TimerPlatform};
