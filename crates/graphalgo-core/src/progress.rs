//! Progress sink.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

/// Receives fraction-complete values in `[0.0, 1.0]`.
///
/// Called at coarse milestones (per BFS source, per Louvain level), possibly
/// from worker threads.
pub trait ProgressLogger: Send + Sync {
    fn log_progress(&self, fraction: f64);

    fn log_done(&self) {
        self.log_progress(1.0);
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressLogger for NoopProgress {
    fn log_progress(&self, _fraction: f64) {}
}

/// Emits an `info!` event each time a new whole percent is reached.
#[derive(Debug)]
pub struct TracingProgress {
    task: &'static str,
    last_percent: AtomicU32,
}

impl TracingProgress {
    #[must_use]
    pub const fn new(task: &'static str) -> Self {
        Self {
            task,
            last_percent: AtomicU32::new(0),
        }
    }
}

impl ProgressLogger for TracingProgress {
    fn log_progress(&self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u32;
        let previous = self.last_percent.fetch_max(percent, Ordering::AcqRel);
        if percent > previous {
            info!(task = self.task, percent, "progress");
        }
    }
}

impl<P: ProgressLogger + ?Sized> ProgressLogger for &P {
    fn log_progress(&self, fraction: f64) {
        (**self).log_progress(fraction);
    }
}
