//! Scoped wall-clock stopwatch
//!
//! Prints an optional left-justified label and then the elapsed time as
//! `HH:MM:SS.mmm` when it goes out of scope.

use std::io::{self, Write};
use std::time::{Duration, Instant};

pub const DEFAULT_JUSTIFY_WIDTH: usize = 50;

pub struct ScopedStopwatch<W: Write = io::Stdout> {
    start: Instant,
    stopped: Option<Duration>,
    label: String,
    justify_width: usize,
    print_label_early: bool,
    out: W,
}

impl ScopedStopwatch<io::Stdout> {
    /// Start timing. With `print_label_early` the label is written now,
    /// otherwise together with the result.
    pub fn new(label: &str, print_label_early: bool) -> Self {
        Self::with_width(label, print_label_early, DEFAULT_JUSTIFY_WIDTH)
    }

    pub fn with_width(label: &str, print_label_early: bool, justify_width: usize) -> Self {
        Self::to_writer(io::stdout(), label, print_label_early, justify_width)
    }
}

impl<W: Write> ScopedStopwatch<W> {
    pub fn to_writer(out: W, label: &str, print_label_early: bool, justify_width: usize) -> Self {
        let mut stopwatch = Self {
            start: Instant::now(),
            stopped: None,
            label: label.trim().to_string(),
            justify_width,
            print_label_early,
            out,
        };
        if print_label_early {
            stopwatch.write_label();
        }
        stopwatch
    }

    /// Time since construction, or the frozen value once stopped.
    pub fn elapsed(&self) -> Duration {
        self.stopped.unwrap_or_else(|| self.start.elapsed())
    }

    /// Stop the clock, print the result and return the printed duration.
    pub fn finish(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.stopped = Some(elapsed);
        elapsed
    }

    fn write_label(&mut self) {
        let label = format_label(&self.label, self.justify_width);
        if !label.is_empty() {
            let _ = write!(self.out, "{}", label);
            let _ = self.out.flush();
        }
    }
}

impl<W: Write> Drop for ScopedStopwatch<W> {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        if !self.print_label_early {
            self.write_label();
        }
        let _ = writeln!(self.out, "{}", format_elapsed(elapsed));
        let _ = self.out.flush();
    }
}

/// Trim `label` and pad it with spaces to at least `width` characters.
/// An empty label stays empty; long labels are never truncated.
pub fn format_label(label: &str, width: usize) -> String {
    let label = label.trim();
    if label.is_empty() {
        return String::new();
    }
    format!("{:<width$}", label, width = width)
}

/// `HH:MM:SS.mmm`; hours keep counting past 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}
