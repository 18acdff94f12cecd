//! Legacy multimedia timer period (`timeBeginPeriod` / `timeEndPeriod`).

/// Raises the scheduler period to `period_ms` until dropped.
#[must_use]
#[cfg_attr(not(windows), allow(dead_code))]
pub struct TimerPeriodGuard {
    period_ms: u32,
    active: bool,
}

impl TimerPeriodGuard {
    pub fn begin(period_ms: u32) -> Self {
        #[cfg(windows)]
        let active = {
            let result = unsafe { windows_sys::Win32::Media::timeBeginPeriod(period_ms) };
            if result != 0 {
                log::warn!("timeBeginPeriod({}) failed with {}", period_ms, result);
            }
            result == 0
        };
        #[cfg(not(windows))]
        let active = false;

        Self { period_ms, active }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Whether the platform accepted the period.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for TimerPeriodGuard {
    fn drop(&mut self) {
        #[cfg(windows)]
        {
            if self.active {
                unsafe {
                    windows_sys::Win32::Media::timeEndPeriod(self.period_ms);
                }
            }
        }
    }
}
