#![forbid(unsafe_code)]
//! graphalgo-algo: algorithms over the [`graphalgo_core::Graph`] contract.
//!
//! Every algorithm follows the same shape: `Algorithm::builder(&graph)`,
//! optional settings, `build()`, then a single `compute()` returning an
//! [`graphalgo_core::Outcome`]. Instances are single-use and expose
//! `release()` to drop their working arrays early.
//!
//! # Conventions
//!
//! - **Errors**: [`graphalgo_core::GraphError`].
//! - **Logging**: `tracing`; `compute` methods are instrumented.

pub mod betweenness;
pub mod louvain;
pub mod scc;
pub mod shortest_path;

pub use betweenness::{BetweennessCentrality, Centrality};
pub use louvain::{Communities, Louvain, modularity};
pub use scc::{Components, StronglyConnectedComponents};
pub use shortest_path::{ShortestPath, ShortestPathDijkstra, ShortestPaths, Target};
