//! Scoped handle over the system timer resolution
//!
//! `HiResTimer` captures the resolution in effect when it is created, lets the
//! caller change it and issue high-precision delays, and puts the captured
//! value back when dropped. The setting is machine-wide, so the restore runs on
//! every exit path.

use crate::timer::platform::{NativeTimerPlatform, PlatformStatus, ResolutionBounds, TimerPlatform};

/// 100ns ticks per millisecond.
pub const TICKS_PER_MS: i64 = 10_000;

pub struct HiResTimer<P: TimerPlatform = NativeTimerPlatform> {
    platform: P,
    minimum: u32,
    maximum: u32,
    current: u32,
    initial: Option<u32>,
    last_status: PlatformStatus,
}

impl HiResTimer<NativeTimerPlatform> {
    /// Query the current resolution without changing it.
    pub fn new() -> Self {
        Self::from_platform(NativeTimerPlatform::default())
    }

    /// Query, then request `max(requested, maximum)`.
    pub fn with_resolution(requested: u32) -> Self {
        Self::from_platform_with_resolution(NativeTimerPlatform::default(), requested)
    }
}

impl Default for HiResTimer<NativeTimerPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: TimerPlatform> HiResTimer<P> {
    pub fn from_platform(platform: P) -> Self {
        let mut timer = Self {
            platform,
            minimum: 0,
            maximum: 0,
            current: 0,
            initial: None,
            last_status: PlatformStatus::SUCCESS,
        };
        if timer.query().is_ok() {
            timer.initial = Some(timer.current);
        }
        timer
    }

    pub fn from_platform_with_resolution(platform: P, requested: u32) -> Self {
        let mut timer = Self::from_platform(platform);
        if timer.last_status.is_success() {
            // Clamps toward the platform's reported maximum only.
            let _ = timer.set_resolution(requested.max(timer.maximum));
        }
        timer
    }

    /// Refresh the bounds from the platform. On failure only `last_status`
    /// changes.
    pub fn query(&mut self) -> Result<ResolutionBounds, PlatformStatus> {
        match self.platform.query_resolution() {
            Ok(bounds) => {
                self.minimum = bounds.minimum;
                self.maximum = bounds.maximum;
                self.current = bounds.current;
                self.last_status = PlatformStatus::SUCCESS;
                Ok(bounds)
            }
            Err(status) => {
                self.last_status = status;
                Err(status)
            }
        }
    }

    /// Request `desired` as the system-wide resolution.
    pub fn set_resolution(&mut self, desired: u32) -> Result<(), PlatformStatus> {
        match self.platform.set_resolution(desired, true) {
            Ok(_) => {
                self.current = desired;
                self.last_status = PlatformStatus::SUCCESS;
                Ok(())
            }
            Err(status) => {
                self.last_status = status;
                Err(status)
            }
        }
    }

    /// Suspend the calling thread for `|interval|` ticks. Positive values are
    /// negated: the platform only takes relative delays.
    pub fn delay(&mut self, interval: i64) -> Result<(), PlatformStatus> {
        let interval = if interval > 0 { -interval } else { interval };
        let result = self.platform.delay_execution(false, interval);
        self.last_status = result.err().unwrap_or(PlatformStatus::SUCCESS);
        result
    }

    pub fn delay_ms(&mut self, ms: i64) -> Result<(), PlatformStatus> {
        self.delay(ms.saturating_mul(TICKS_PER_MS))
    }

    pub fn minimum_resolution(&self) -> u32 {
        self.minimum
    }

    pub fn maximum_resolution(&self) -> u32 {
        self.maximum
    }

    pub fn current_resolution(&self) -> u32 {
        self.current
    }

    /// Resolution captured by the first successful query, if any.
    pub fn initial_resolution(&self) -> Option<u32> {
        self.initial
    }

    pub fn last_status(&self) -> PlatformStatus {
        self.last_status
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}

impl<P: TimerPlatform> Drop for HiResTimer<P> {
    fn drop(&mut self) {
        if let Some(initial) = self.initial {
            if let Err(status) = self.set_resolution(initial) {
                log::debug!("failed to restore timer resolution {}: status {}", initial, status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Query,
        Set(u32),
        Delay(i64),
    }

    #[derive(Default)]
    struct State {
        bounds: ResolutionBounds,
        calls: Vec<Call>,
        fail_query: Option<PlatformStatus>,
        fail_set: Option<PlatformStatus>,
    }

    /// Records every call and tracks the "system" resolution.
    #[derive(Clone, Default)]
    struct RecordingPlatform(Rc<RefCell<State>>);

    impl RecordingPlatform {
        fn windows_like() -> Self {
            let platform = Self::default();
            platform.0.borrow_mut().bounds = ResolutionBounds { minimum: 156_250, maximum: 5_000, current: 156_250 };
            platform
        }

        fn calls(&self) -> Vec<Call> {
            self.0.borrow().calls.clone()
        }

        fn current(&self) -> u32 {
            self.0.borrow().bounds.current
        }
    }

    impl TimerPlatform for RecordingPlatform {
        fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus> {
            let mut state = self.0.borrow_mut();
            state.calls.push(Call::Query);
            match state.fail_query {
                Some(status) => Err(status),
                None => Ok(state.bounds),
            }
        }

        fn set_resolution(&self, desired: u32, _set: bool) -> Result<u32, PlatformStatus> {
            let mut state = self.0.borrow_mut();
            state.calls.push(Call::Set(desired));
            if let Some(status) = state.fail_set {
                return Err(status);
            }
            state.bounds.current = desired;
            Ok(desired)
        }

        fn delay_execution(&self, _alertable: bool, interval: i64) -> Result<(), PlatformStatus> {
            self.0.borrow_mut().calls.push(Call::Delay(interval));
            Ok(())
        }
    }

    #[test]
    fn default_construction_only_queries() {
        let platform = RecordingPlatform::windows_like();
        let timer = HiResTimer::from_platform(platform.clone());
        assert!(timer.last_status().is_success());
        assert_eq!(timer.minimum_resolution(), 156_250);
        assert_eq!(timer.maximum_resolution(), 5_000);
        assert_eq!(timer.current_resolution(), 156_250);
        assert_eq!(timer.initial_resolution(), Some(156_250));
        assert_eq!(platform.calls(), vec![Call::Query]);
    }

    #[test]
    fn drop_without_set_leaves_resolution_unchanged() {
        let platform = RecordingPlatform::windows_like();
        {
            let _timer = HiResTimer::from_platform(platform.clone());
        }
        assert_eq!(platform.current(), 156_250);
        assert_eq!(platform.calls(), vec![Call::Query, Call::Set(156_250)]);
    }

    #[test]
    fn requested_resolution_is_clamped_up_to_maximum() {
        let platform = RecordingPlatform::windows_like();
        let timer = HiResTimer::from_platform_with_resolution(platform.clone(), 0);
        assert_eq!(timer.current_resolution(), 5_000);
        assert_eq!(platform.current(), 5_000);

        let coarse = HiResTimer::from_platform_with_resolution(RecordingPlatform::windows_like(), 10_000);
        assert_eq!(coarse.current_resolution(), 10_000);
    }

    #[test]
    fn drop_restores_initial_resolution() {
        let platform = RecordingPlatform::windows_like();
        {
            let mut timer = HiResTimer::from_platform_with_resolution(platform.clone(), 0);
            timer.set_resolution(20_000).unwrap();
            assert_eq!(platform.current(), 20_000);
        }
        assert_eq!(platform.current(), 156_250);
        assert_eq!(platform.calls().last(), Some(&Call::Set(156_250)));
    }

    #[test]
    fn failed_query_skips_set_and_restore() {
        let platform = RecordingPlatform::windows_like();
        platform.0.borrow_mut().fail_query = Some(PlatformStatus(0xC000_0022));
        {
            let timer = HiResTimer::from_platform_with_resolution(platform.clone(), 0);
            assert_eq!(timer.last_status(), PlatformStatus(0xC000_0022));
            assert_eq!(timer.initial_resolution(), None);
            assert_eq!(timer.current_resolution(), 0);
        }
        assert_eq!(platform.calls(), vec![Call::Query]);
    }

    #[test]
    fn failed_set_keeps_current_and_records_status() {
        let platform = RecordingPlatform::windows_like();
        let mut timer = HiResTimer::from_platform(platform.clone());
        platform.0.borrow_mut().fail_set = Some(PlatformStatus(0xC000_000D));

        assert_eq!(timer.set_resolution(5_000), Err(PlatformStatus(0xC000_000D)));
        assert_eq!(timer.current_resolution(), 156_250);
        assert_eq!(timer.last_status(), PlatformStatus(0xC000_000D));

        // Restore on drop also fails; it must not panic.
        drop(timer);
        assert_eq!(platform.current(), 156_250);
    }

    #[test]
    fn delay_always_passes_non_positive_interval() {
        let platform = RecordingPlatform::windows_like();
        let mut timer = HiResTimer::from_platform(platform.clone());
        timer.delay(1).unwrap();
        timer.delay(-1).unwrap();
        timer.delay(0).unwrap();
        timer.delay(i64::MAX).unwrap();

        let delays: Vec<i64> = platform
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delay(interval) => Some(interval),
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![-1, -1, 0, -i64::MAX]);
        assert!(delays.iter().all(|&interval| interval <= 0));
    }

    #[test]
    fn delay_ms_converts_to_ticks() {
        let platform = RecordingPlatform::windows_like();
        let mut timer = HiResTimer::from_platform(platform.clone());
        timer.delay_ms(5).unwrap();
        assert_eq!(platform.calls().last(), Some(&Call::Delay(-50_000)));
    }

    #[test]
    fn query_failure_after_construction_only_touches_status() {
        let platform = RecordingPlatform::windows_like();
        let mut timer = HiResTimer::from_platform(platform.clone());
        platform.0.borrow_mut().fail_query = Some(PlatformStatus(1));
        assert!(timer.query().is_err());
        assert_eq!(timer.last_status(), PlatformStatus(1));
        assert_eq!(timer.current_resolution(), 156_250);
        assert_eq!(timer.initial_resolution(), Some(156_250));
    }
}
