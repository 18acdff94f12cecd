//! Benchmark routines
//!
//! Each routine times a fixed number of sleep/delay/hand-off operations with a
//! `ScopedStopwatch`. Routines that touch the system timer resolution put it
//! back before the stopwatch reports.

use std::io::{self, Error, ErrorKind};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colored::*;
use serde::{Deserialize, Serialize};

use crate::core::signal::AutoResetEvent;
use crate::stats::{RoutineOutcome, RoutineReport};
use crate::timer::{HiResTimer, NativeTimerPlatform, PlatformStatus, TimerPeriodGuard, TimerPlatform};
use crate::utils::ScopedStopwatch;

/// Capacity of the queue in the blocking hand-off routine.
const QUEUE_CAPACITY: usize = 3;
/// Head start given to worker threads before timing begins.
const WORKER_WARMUP: Duration = Duration::from_millis(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Routine {
    EmptyLoop,
    SleepDefault,
    SleepPeriod,
    AsyncDelay,
    NtDelayManual,
    #[serde(rename = "hires-timer")]
    HiResTimer,
    EventHandoff,
    BlockingQueue,
}

impl Routine {
    pub const ALL: [Routine; 8] = [
        Routine::EmptyLoop,
        Routine::SleepDefault,
        Routine::SleepPeriod,
        Routine::AsyncDelay,
        Routine::NtDelayManual,
        Routine::HiResTimer,
        Routine::EventHandoff,
        Routine::BlockingQueue,
    ];

    /// Routines run when no selection is configured.
    pub fn default_selection() -> Vec<Routine> {
        vec![
            Routine::EmptyLoop,
            Routine::SleepDefault,
            Routine::SleepPeriod,
            Routine::HiResTimer,
            Routine::EventHandoff,
            Routine::BlockingQueue,
        ]
    }

    /// Configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Routine::EmptyLoop => "empty-loop",
            Routine::SleepDefault => "sleep-default",
            Routine::SleepPeriod => "sleep-period",
            Routine::AsyncDelay => "async-delay",
            Routine::NtDelayManual => "nt-delay-manual",
            Routine::HiResTimer => "hires-timer",
            Routine::EventHandoff => "event-handoff",
            Routine::BlockingQueue => "blocking-queue",
        }
    }
}

type Timed = (Duration, RoutineOutcome);

pub struct RoutineRunner<P: TimerPlatform = NativeTimerPlatform> {
    platform: P,
    iterations: u32,
    justify_width: usize,
}

impl RoutineRunner<NativeTimerPlatform> {
    pub fn new(iterations: u32, justify_width: usize) -> Self {
        Self::with_platform(NativeTimerPlatform::default(), iterations, justify_width)
    }
}

impl<P: TimerPlatform> RoutineRunner<P> {
    pub fn with_platform(platform: P, iterations: u32, justify_width: usize) -> Self {
        Self { platform, iterations, justify_width }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub async fn run(&self, routine: Routine) -> io::Result<RoutineReport> {
        log::debug!("running {} ({} iterations)", routine.name(), self.iterations);
        let (elapsed, outcome) = match routine {
            Routine::EmptyLoop => self.empty_loop(),
            Routine::SleepDefault => self.sleep_default(),
            Routine::SleepPeriod => self.sleep_period(),
            Routine::AsyncDelay => self.async_delay().await,
            Routine::NtDelayManual => self.nt_delay_manual(),
            Routine::HiResTimer => self.hires_timer(),
            Routine::EventHandoff => self.event_handoff()?,
            Routine::BlockingQueue => self.blocking_queue()?,
        };
        Ok(RoutineReport { routine, iterations: self.iterations, elapsed, outcome })
    }

    fn stopwatch(&self, label: &str, print_label_early: bool) -> ScopedStopwatch {
        ScopedStopwatch::with_width(label, print_label_early, self.justify_width)
    }

    fn empty_loop(&self) -> Timed {
        let stopwatch = self.stopwatch("Running empty loop estimation:", false);
        for _ in 0..self.iterations {
            thread::sleep(Duration::ZERO);
        }
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    fn sleep_default(&self) -> Timed {
        let stopwatch = self.stopwatch("Running timer (timeBeginPeriod: default), Sleep:", true);
        for _ in 0..self.iterations {
            thread::sleep(Duration::from_millis(1));
        }
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    fn sleep_period(&self) -> Timed {
        let stopwatch = self.stopwatch("Running timer (timeBeginPeriod(1), Sleep):", true);
        let period = TimerPeriodGuard::begin(1);
        for _ in 0..self.iterations {
            thread::sleep(Duration::from_millis(1));
        }
        drop(period);
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    async fn async_delay(&self) -> Timed {
        let stopwatch = self.stopwatch("Running timer (timeBeginPeriod(1), Delay):", true);
        let period = TimerPeriodGuard::begin(1);
        for _ in 0..self.iterations {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(period);
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    /// Drives the platform calls directly, saving and restoring the
    /// resolution by hand.
    fn nt_delay_manual(&self) -> Timed {
        println!();
        println!("Running timer (NtSetTimerResolution, NtDelayExecution)");
        let stopwatch = self.stopwatch("Elapsed: ", false);

        let bounds = match self.platform.query_resolution() {
            Ok(bounds) => bounds,
            Err(status) => return abort(stopwatch, status),
        };
        let previous = bounds.current;
        if let Err(status) = self.platform.set_resolution(bounds.maximum, true) {
            return abort(stopwatch, status);
        }
        let new_resolution = self
            .platform
            .query_resolution()
            .map(|b| b.current)
            .unwrap_or(bounds.maximum);
        println!(
            "MinRes = {}, MaxRes = {}, PrevRes = {}, NewRes = {}",
            bounds.minimum, bounds.maximum, previous, new_resolution
        );

        for _ in 0..self.iterations {
            let _ = self.platform.delay_execution(false, -1);
        }

        if let Err(status) = self.platform.set_resolution(previous, true) {
            log::debug!("failed to restore timer resolution {}: status {}", previous, status);
        }
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    fn hires_timer(&self) -> Timed {
        println!();
        println!("Running timer (NtSetTimerResolution, NtDelayExecution)");
        let stopwatch = self.stopwatch("Elapsed (new implementation): ", false);

        // Requests the finest resolution the platform reports.
        let mut timer = HiResTimer::from_platform_with_resolution(&self.platform, 0);
        let status = timer.last_status();
        if !status.is_success() {
            drop(timer);
            return abort(stopwatch, status);
        }

        println!(
            "MinRes = {}, MaxRes = {}, PrevRes = {}, NewRes = {}",
            timer.minimum_resolution(),
            timer.maximum_resolution(),
            timer.initial_resolution().unwrap_or_default(),
            timer.current_resolution()
        );

        for _ in 0..self.iterations {
            let _ = timer.delay(-1);
        }

        drop(timer);
        (stopwatch.finish(), RoutineOutcome::Completed)
    }

    /// Ping-pong between this thread and a worker over two auto-reset events.
    fn event_handoff(&self) -> io::Result<Timed> {
        let reply = Arc::new(AutoResetEvent::new(false));
        let request = Arc::new(AutoResetEvent::new(false));
        let iterations = self.iterations;

        let worker = {
            let reply = Arc::clone(&reply);
            let request = Arc::clone(&request);
            thread::Builder::new().name("event-responder".to_string()).spawn(move || {
                for _ in 0..iterations {
                    request.wait();
                    reply.set();
                }
            })?
        };

        thread::sleep(WORKER_WARMUP);
        let stopwatch = self.stopwatch("Test WaitOne / AutoResetEvent", false);
        for _ in 0..iterations {
            request.set();
            reply.wait();
        }
        let elapsed = stopwatch.finish();

        join_worker(worker)?;
        Ok((elapsed, RoutineOutcome::Completed))
    }

    /// Consume from a bounded queue fed by a worker thread.
    fn blocking_queue(&self) -> io::Result<Timed> {
        let (sender, receiver) = crossbeam_channel::bounded::<u32>(QUEUE_CAPACITY);
        let iterations = self.iterations;

        let worker = thread::Builder::new().name("queue-producer".to_string()).spawn(move || {
            for i in 0..iterations {
                if sender.send(i).is_err() {
                    break;
                }
            }
        })?;

        thread::sleep(WORKER_WARMUP);
        let stopwatch = self.stopwatch("Test BlockingCollection", false);
        for _ in 0..iterations {
            receiver
                .recv()
                .map_err(|e| Error::new(ErrorKind::BrokenPipe, format!("producer stopped early: {}", e)))?;
        }
        let elapsed = stopwatch.finish();

        join_worker(worker)?;
        Ok((elapsed, RoutineOutcome::Completed))
    }
}

fn abort(stopwatch: ScopedStopwatch, status: PlatformStatus) -> Timed {
    println!(
        "{}",
        format!("Error setting timer resolution, nt status code = {}", status).as_str().red()
    );
    (stopwatch.finish(), RoutineOutcome::Aborted(status))
}

fn join_worker(worker: thread::JoinHandle<()>) -> io::Result<()> {
    worker
        .join()
        .map_err(|_| Error::new(ErrorKind::Other, "worker thread panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::platform::{PortableTimerPlatform, ResolutionBounds};
    use std::cell::{Cell, RefCell};

    /// Windows-like bounds; counts delays and remembers every set.
    struct FakePlatform {
        current: Cell<u32>,
        sets: RefCell<Vec<u32>>,
        delays: Cell<u32>,
    }

    impl FakePlatform {
        fn new() -> Self {
            Self { current: Cell::new(156_250), sets: RefCell::new(Vec::new()), delays: Cell::new(0) }
        }
    }

    impl TimerPlatform for FakePlatform {
        fn query_resolution(&self) -> Result<ResolutionBounds, PlatformStatus> {
            Ok(ResolutionBounds { minimum: 156_250, maximum: 5_000, current: self.current.get() })
        }

        fn set_resolution(&self, desired: u32, _set: bool) -> Result<u32, PlatformStatus> {
            self.sets.borrow_mut().push(desired);
            self.current.set(desired);
            Ok(desired)
        }

        fn delay_execution(&self, _alertable: bool, interval: i64) -> Result<(), PlatformStatus> {
            assert!(interval <= 0);
            self.delays.set(self.delays.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn routine_names_round_trip_through_serde() {
        for routine in Routine::ALL {
            let json = serde_json::to_string(&routine).unwrap();
            assert_eq!(json, format!("\"{}\"", routine.name()));
            assert_eq!(serde_json::from_str::<Routine>(&json).unwrap(), routine);
        }
    }

    #[test]
    fn default_selection_skips_async_and_manual_routines() {
        let selection = Routine::default_selection();
        assert_eq!(selection.len(), 6);
        assert!(!selection.contains(&Routine::AsyncDelay));
        assert!(!selection.contains(&Routine::NtDelayManual));
    }

    #[tokio::test]
    async fn hires_timer_routine_delays_and_restores() {
        let runner = RoutineRunner::with_platform(FakePlatform::new(), 25, 50);
        let report = runner.run(Routine::HiResTimer).await.unwrap();
        assert_eq!(report.outcome, RoutineOutcome::Completed);
        assert_eq!(report.iterations, 25);
        assert_eq!(runner.platform.delays.get(), 25);
        assert_eq!(*runner.platform.sets.borrow(), vec![5_000, 156_250]);
        assert_eq!(runner.platform.current.get(), 156_250);
    }

    #[tokio::test]
    async fn manual_routine_restores_previous_resolution() {
        let runner = RoutineRunner::with_platform(FakePlatform::new(), 10, 50);
        let report = runner.run(Routine::NtDelayManual).await.unwrap();
        assert_eq!(report.outcome, RoutineOutcome::Completed);
        assert_eq!(runner.platform.delays.get(), 10);
        assert_eq!(*runner.platform.sets.borrow(), vec![5_000, 156_250]);
    }

    #[tokio::test]
    async fn resolution_routines_abort_without_platform_support() {
        let runner = RoutineRunner::with_platform(PortableTimerPlatform, 10, 50);
        for routine in [Routine::HiResTimer, Routine::NtDelayManual] {
            let report = runner.run(routine).await.unwrap();
            assert_eq!(report.outcome, RoutineOutcome::Aborted(PlatformStatus::NOT_IMPLEMENTED));
        }
    }

    #[tokio::test]
    async fn sleep_routines_take_at_least_the_requested_time() {
        let runner = RoutineRunner::with_platform(PortableTimerPlatform, 5, 50);
        for routine in [Routine::SleepDefault, Routine::SleepPeriod, Routine::AsyncDelay] {
            let report = runner.run(routine).await.unwrap();
            assert_eq!(report.outcome, RoutineOutcome::Completed);
            assert!(report.elapsed >= Duration::from_millis(5), "{:?}", routine);
        }
    }

    #[tokio::test]
    async fn cross_thread_routines_complete() {
        let runner = RoutineRunner::with_platform(PortableTimerPlatform, 200, 50);
        for routine in [Routine::EmptyLoop, Routine::EventHandoff, Routine::BlockingQueue] {
            let report = runner.run(routine).await.unwrap();
            assert_eq!(report.outcome, RoutineOutcome::Completed);
            assert_eq!(report.iterations, 200);
        }
    }
}
