//! Platform timer interface
//!
//! The three kernel entry points the benchmark is built on: query and set of
//! the system timer resolution, and a relative delay. All values are in
//! 100-nanosecond ticks.

use std::fmt;
use std::io;

/// Raw status code returned by a platform call. Zero is success, anything else
/// is passed through undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlatformStatus(pub u32);

impl PlatformStatus {
    pub const SUCCESS: PlatformStatus = PlatformStatus(0);
    /// `STATUS_NOT_IMPLEMENTED`
    pub const NOT_IMPLEMENTED: PlatformStatus = PlatformStatus(0xC000_0002);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// `Ok(())` on success, the status itself as the error otherwise.
    pub fn ok(self) -> Result<(), PlatformStatus> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl std::error::Error for PlatformStatus {}

impl From<PlatformStatus> for io::Error {
    fn from(status: PlatformStatus) -> Self {
        io::Error::new(io::ErrorKind::Other, format!("platform timer call failed with status {}", status))
    }
}

/// Resolution bounds reported by the platform.
///
/// Windows naming is inverted from intuition: `minimum` is the coarsest
/// interval (~156250) and `maximum` the finest (~5000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionBounds {
    pub minimum: u32,
    pub maximum: u32,
    pub current: u32,
}

/// Abstract capability over the OS timer primitives.
pub trait TimerPlatform {
    /// Read the current resolution bounds.
    fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus>;

    /// Request (`set == true`) or release (`set == false`) `desired` as the
    /// system-wide resolution. Returns the resolution now in effect.
    fn set_resolution(&self, desired: u32, set: bool) -> Result<u32, PlatformStatus>;

    /// Suspend the calling thread. `interval` is a relative delay, so it must
    /// be zero or negative.
    fn delay_execution(&self, alertable: bool, interval: i64) -> Result<(), PlatformStatus>;
}

impl<P: TimerPlatform + ?Sized> TimerPlatform for &P {
    fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus> {
        (**self).query_resolution()
    }

    fn set_resolution(&self, desired: u32, set: bool) -> Result<u32, PlatformStatus> {
        (**self).set_resolution(desired, set)
    }

    fn delay_execution(&self, alertable: bool, interval: i64) -> Result<(), PlatformStatus> {
        (**self).delay_execution(alertable, interval)
    }
}

// ============================================================================
// WINDOWS (ntdll)
// ============================================================================

#[cfg(windows)]
mod ntdll {
    use windows_sys::Win32::Foundation::{BOOLEAN, NTSTATUS};

    #[link(name = "ntdll")]
    extern "system" {
        pub fn NtQueryTimerResolution(
            minimum_resolution: *mut u32,
            maximum_resolution: *mut u32,
            current_resolution: *mut u32,
        ) -> NTSTATUS;

        pub fn NtSetTimerResolution(
            desired_resolution: u32,
            set_resolution: BOOLEAN,
            current_resolution: *mut u32,
        ) -> NTSTATUS;

        pub fn NtDelayExecution(alertable: BOOLEAN, delay_interval: *const i64) -> NTSTATUS;
    }
}

/// Native implementation on top of the undocumented ntdll timer calls.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NtTimerPlatform;

#[cfg(windows)]
impl TimerPlatform for NtTimerPlatform {
    fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus> {
        let mut bounds = ResolutionBounds::default();
        let status = unsafe {
            ntdll::NtQueryTimerResolution(&mut bounds.minimum, &mut bounds.maximum, &mut bounds.current)
        };
        let status = PlatformStatus(status as u32);
        log::trace!("NtQueryTimerResolution -> {} {:?}", status, bounds);
        status.ok().map(|()| bounds)
    }

    fn set_resolution(&self, desired: u32, set: bool) -> Result<u32, PlatformStatus> {
        let mut current = 0u32;
        let status = unsafe { ntdll::NtSetTimerResolution(desired, set as u8, &mut current) };
        let status = PlatformStatus(status as u32);
        log::trace!("NtSetTimerResolution({}, {}) -> {} current={}", desired, set, status, current);
        status.ok().map(|()| current)
    }

    fn delay_execution(&self, alertable: bool, interval: i64) -> Result<(), PlatformStatus> {
        debug_assert!(interval <= 0);
        let status = unsafe { ntdll::NtDelayExecution(alertable as u8, &interval) };
        PlatformStatus(status as u32).ok()
    }
}

// ============================================================================
// PORTABLE FALLBACK
// ============================================================================

/// Fallback for targets without ntdll. Resolution calls report
/// `STATUS_NOT_IMPLEMENTED`; delays become a thread sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableTimerPlatform;

impl TimerPlatform for PortableTimerPlatform {
    fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus> {
        Err(PlatformStatus::NOT_IMPLEMENTED)
    }

    fn set_resolution(&self, _desired: u32, _set: bool) -> Result<u32, PlatformStatus> {
        Err(PlatformStatus::NOT_IMPLEMENTED)
    }

    fn delay_execution(&self, _alertable: bool, interval: i64) -> Result<(), PlatformStatus> {
        let nanos = interval.unsigned_abs().saturating_mul(100);
        std::thread::sleep(std::time::Duration::from_nanos(nanos));
        Ok(())
    }
}

/// The platform the benchmark runs against on this target.
#[cfg(windows)]
pub type NativeTimerPlatform = NtTimerPlatform;

#[cfg(not(windows))]
pub type NativeTimerPlatform = PortableTimerPlatform;
