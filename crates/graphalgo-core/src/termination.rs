//! Cooperative cancellation.
//!
//! Algorithms poll a [`TerminationFlag`] at coarse checkpoints (per BFS pop,
//! per Tarjan frame, per Louvain pass). A `false` from [`TerminationFlag::running`]
//! ends the computation with a partial result, never an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Pollable "continue running?" source.
pub trait TerminationFlag: Send + Sync {
    fn running(&self) -> bool;
}

/// Never terminates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningTrue;

impl TerminationFlag for RunningTrue {
    #[inline]
    fn running(&self) -> bool {
        true
    }
}

/// Shared flag flipped from another thread.
#[derive(Debug, Clone, Default)]
pub struct AtomicTerminationFlag {
    terminated: Arc<AtomicBool>,
}

impl AtomicTerminationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }
}

impl TerminationFlag for AtomicTerminationFlag {
    #[inline]
    fn running(&self) -> bool {
        !self.terminated.load(Ordering::Acquire)
    }
}

/// Stops once a deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineFlag {
    deadline: Instant,
}

impl DeadlineFlag {
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    #[must_use]
    pub const fn at(deadline: Instant) -> Self {
        Self { deadline }
    }
}

impl TerminationFlag for DeadlineFlag {
    fn running(&self) -> bool {
        Instant::now() < self.deadline
    }
}

impl<F> TerminationFlag for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn running(&self) -> bool {
        self()
    }
}
