//! Progress reporting for the hashing pipeline.
//!
//! Progress is counted in KiB of content hashed. Two traits meet here:
//!
//! - [`ProgressSink`] is what the [`Hasher`](crate::scanner::Hasher) talks to.
//!   It distinguishes a non-blocking attempt from a forced publication so the
//!   hasher can batch deltas while the shared lock is busy.
//! - [`ProgressObserver`] is what callers register to *receive* progress.
//!   Any `Fn(u64) + Send + Sync` closure is an observer.
//!
//! [`TerminalProgress`] renders an indicatif bar for the command-line
//! front-end.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Destination for per-file progress deltas.
pub trait ProgressSink: Send + Sync {
    /// Publish `units` only if it can be done without blocking.
    ///
    /// Returns `false` when the underlying lock is contended; the caller
    /// keeps the delta and retries later.
    fn try_publish(&self, units: u64) -> bool;

    /// Publish `units`, blocking if necessary.
    fn publish(&self, units: u64);
}

/// Sink that discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn try_publish(&self, _units: u64) -> bool {
        true
    }

    fn publish(&self, _units: u64) {}
}

/// Receiver of scan progress.
///
/// Called from worker threads, one call at a time, with non-decreasing
/// values. Callbacks run outside the scan's progress lock.
pub trait ProgressObserver: Send + Sync {
    /// Called once the progress range is known (total candidate KiB).
    fn on_total(&self, _total_units: u64) {}

    /// Called with the cumulative number of KiB hashed so far.
    fn on_progress(&self, units_done: u64);

    /// Called when the scan reaches a terminal state.
    fn on_finish(&self) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_progress(&self, units_done: u64) {
        self(units_done);
    }
}

/// Terminal progress bar using indicatif.
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl TerminalProgress {
    /// Create a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `hidden` - If true, nothing is drawn.
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            hidden,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} KiB ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_total(&self, total_units: u64) {
        let bar = ProgressBar::new(total_units);
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_style(Self::style());
        bar.set_message("Hashing files");
        *self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(bar);
    }

    fn on_progress(&self, units_done: u64) {
        if let Some(ref bar) = *self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            bar.set_position(units_done);
        }
    }

    fn on_finish(&self) {
        if let Some(bar) = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            bar.finish_and_clear();
        }
    }
}
