//! Shared single-use lifecycle for algorithm instances.

use crate::error::GraphError;

/// A computed value plus whether the run finished.
///
/// `completed == false` means the termination flag stopped the run and
/// `value` holds the partial result of the last finished unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub completed: bool,
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn complete(value: T) -> Self {
        Self {
            value,
            completed: true,
        }
    }

    #[must_use]
    pub const fn partial(value: T) -> Self {
        Self {
            value,
            completed: false,
        }
    }

    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            completed: self.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ready,
    Computed,
    Released,
}

/// Ready -> Computed | Released. Only `Ready` may compute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle {
    state: State,
}

impl Lifecycle {
    /// Transition into `Computed`.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadyComputed`] after a previous compute,
    /// [`GraphError::Released`] after release.
    pub fn begin_compute(&mut self, algorithm: &'static str) -> Result<(), GraphError> {
        match self.state {
            State::Ready => {
                self.state = State::Computed;
                Ok(())
            }
            State::Computed => Err(GraphError::AlreadyComputed(algorithm)),
            State::Released => Err(GraphError::Released(algorithm)),
        }
    }

    pub fn release(&mut self) {
        self.state = State::Released;
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.state == State::Released
    }
}
