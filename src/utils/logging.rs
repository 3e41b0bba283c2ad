use log::{Level, log_enabled, warn};
use std::time::{Duration, Instant};

/// Simple scoped timer for profiling step phases.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!(
                "end {} ({} µs)",
                self.label,
                self.start.elapsed().as_micros()
            );
        }
    }
}

/// Warns when a simulation step took longer than its wall-clock budget.
pub fn warn_if_step_budget_exceeded(duration: Duration, budget_ms: f64) {
    let elapsed_ms = duration.as_secs_f64() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!("Step exceeded budget: {elapsed_ms:.2} ms > {budget_ms:.2} ms");
    }
}
