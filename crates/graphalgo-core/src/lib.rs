//! graphalgo-core: graph storage, traversal contracts, and the execution
//! harness shared by every algorithm.
//!
//! # Conventions
//!
//! - **Errors**: library APIs return [`GraphError`]; configuration file
//!   loading returns `anyhow::Result`.
//! - **Logging**: `tracing` macros only; the binary decides on a subscriber.
//! - **Ids**: algorithms operate on mapped ids ([`NodeId`]) and translate at
//!   the edges via [`IdMap`].

pub mod algorithm;
pub mod config;
pub mod direction;
pub mod error;
pub mod executor;
pub mod export;
pub mod graph;
pub mod huge_array;
pub mod ids;
pub mod loader;
pub mod progress;
pub mod termination;
pub mod timing;

pub use algorithm::{Lifecycle, Outcome};
pub use config::{Backend, EngineConfig, LoadConfig, LouvainConfig, WeightMode};
pub use direction::Direction;
pub use error::{ErrorCode, GraphError};
pub use executor::Executor;
pub use graph::{AnyGraph, DenseGraph, Graph, HugeGraph, NodeId, RelationshipId, UNREACHABLE};
pub use ids::IdMap;
pub use loader::{EdgeListSource, GraphLoader, GraphSource};
pub use progress::{NoopProgress, ProgressLogger, TracingProgress};
pub use termination::{AtomicTerminationFlag, DeadlineFlag, RunningTrue, TerminationFlag};
