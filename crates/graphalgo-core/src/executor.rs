//! Explicit execution context for parallel algorithms.
//!
//! The pool is created once by its owner and passed into algorithm builders
//! by handle. Algorithms never build or shut down pools themselves.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::GraphError;

/// Cheap-to-clone handle to a shared worker pool.
#[derive(Debug, Clone)]
pub struct Executor {
    pool: Arc<ThreadPool>,
    concurrency: usize,
}

impl Executor {
    /// Build a pool with `concurrency` workers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for zero workers and
    /// [`GraphError::ThreadPool`] when the OS refuses the threads.
    pub fn new(concurrency: usize) -> Result<Self, GraphError> {
        if concurrency == 0 {
            return Err(GraphError::config("concurrency must be at least 1"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("galgo-worker-{i}"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
            concurrency,
        })
    }

    /// One worker; parallel code paths run deterministically.
    ///
    /// # Errors
    ///
    /// See [`Executor::new`].
    pub fn single_threaded() -> Result<Self, GraphError> {
        Self::new(1)
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `op` inside the pool so rayon iterators use its workers.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }
}
