//! Louvain community detection.
//!
//! # Overview
//!
//! Multilevel modularity optimization over the symmetric (`Both`) view of the
//! graph:
//!
//! 1. **Local moving.** Starting from singletons, nodes repeatedly move to
//!    the neighboring community with the best modularity gain until a full
//!    pass moves nothing or `max_iterations` passes ran.
//! 2. **Coarsening.** Each community becomes a super-node; weights between
//!    communities are summed and intra-community weight becomes a self-loop.
//! 3. Repeat on the coarse graph until a level moves nothing or
//!    `max_levels` is reached.
//!
//! Assignments from every level are composed back onto base nodes.
//!
//! # Variants
//!
//! - `weighted(false)` uses unit weights; `weighted(true)` uses relationship
//!   weights and requires them to be loaded.
//! - Without an [`Executor`] each pass moves nodes in place, in id order.
//!   With one, the node range is partitioned across the pool's workers;
//!   each proposes moves against the state at pass start and moves are
//!   applied between passes (see [`modularity::parallel_pass`]).
//!
//! The termination flag is polled once per pass.

mod level;
mod modularity;

pub use modularity::modularity;

use graphalgo_core::progress::{NoopProgress, ProgressLogger};
use graphalgo_core::termination::{RunningTrue, TerminationFlag};
use graphalgo_core::{Executor, Graph, GraphError, Lifecycle, LouvainConfig, NodeId, Outcome};
use serde::Serialize;
use tracing::{debug, info, instrument};

use level::{LevelGraph, renumber};
use modularity::{MoveState, parallel_pass, sequential_pass};

const NAME: &str = "Louvain";

pub struct LouvainBuilder<'a, G> {
    graph: &'a G,
    config: LouvainConfig,
    executor: Option<&'a Executor>,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
}

impl<'a, G: Graph> LouvainBuilder<'a, G> {
    /// Take `weighted`, `max_iterations`, and `max_levels` from `config`.
    /// Its `concurrency` only matters to whoever builds the [`Executor`].
    #[must_use]
    pub fn config(mut self, config: &LouvainConfig) -> Self {
        self.config = config.clone();
        self
    }

    #[must_use]
    pub const fn weighted(mut self, weighted: bool) -> Self {
        self.config.weighted = weighted;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub const fn max_levels(mut self, max_levels: usize) -> Self {
        self.config.max_levels = max_levels;
        self
    }

    /// Run passes partitioned across this pool.
    #[must_use]
    pub const fn executor(mut self, executor: &'a Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn termination(mut self, termination: &'a dyn TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: &'a dyn ProgressLogger) -> Self {
        self.progress = progress;
        self
    }

    /// # Errors
    ///
    /// [`GraphError::Config`] for zero caps, [`GraphError::MissingWeights`]
    /// for a weighted run on a graph loaded without weights.
    pub fn build(self) -> Result<Louvain<'a, G>, GraphError> {
        if self.config.max_iterations == 0 {
            return Err(GraphError::Config {
                reason: "max_iterations must be at least 1".to_string(),
            });
        }
        if self.config.max_levels == 0 {
            return Err(GraphError::Config {
                reason: "max_levels must be at least 1".to_string(),
            });
        }
        if self.config.weighted && !self.graph.has_relationship_weights() {
            return Err(GraphError::MissingWeights { algorithm: NAME });
        }
        Ok(Louvain {
            graph: self.graph,
            weighted: self.config.weighted,
            max_iterations: self.config.max_iterations,
            max_levels: self.config.max_levels,
            executor: self.executor,
            termination: self.termination,
            progress: self.progress,
            lifecycle: Lifecycle::default(),
            level: None,
        })
    }
}

pub struct Louvain<'a, G> {
    graph: &'a G,
    weighted: bool,
    max_iterations: usize,
    max_levels: usize,
    executor: Option<&'a Executor>,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
    lifecycle: Lifecycle,
    level: Option<LevelGraph>,
}

/// Outcome of optimizing one level.
struct LevelRun {
    state: MoveState,
    passes: usize,
    moves: usize,
    completed: bool,
}

impl<'a, G: Graph> Louvain<'a, G> {
    #[must_use]
    pub fn builder(graph: &'a G) -> LouvainBuilder<'a, G> {
        LouvainBuilder {
            graph,
            config: LouvainConfig::default(),
            executor: None,
            termination: &RunningTrue,
            progress: &NoopProgress,
        }
    }

    /// # Errors
    ///
    /// [`GraphError::AlreadyComputed`] or [`GraphError::Released`] when the
    /// instance was already used.
    #[instrument(
        skip(self),
        fields(
            weighted = self.weighted,
            parallel = self.executor.is_some(),
            nodes = self.graph.node_count()
        )
    )]
    pub fn compute(&mut self) -> Result<Outcome<Communities>, GraphError> {
        self.lifecycle.begin_compute(NAME)?;

        let base = LevelGraph::from_graph(self.graph, self.weighted, self.executor);
        let mut assignment: Vec<usize> = (0..base.node_count()).collect();
        let mut modularity = base.modularity(&assignment);
        let mut level_modularities = Vec::new();
        let mut iterations = 0;
        let mut levels = 0;
        let mut completed = true;
        self.level = Some(base);

        while levels < self.max_levels {
            let Some(level) = self.level.as_ref() else {
                break;
            };
            let run = self.optimize(level);
            iterations += run.passes;
            completed = run.completed;

            if run.moves == 0 {
                debug!(level = levels, "no improving move, stopping");
                break;
            }

            let (community, count) = renumber(&run.state.community);
            for slot in &mut assignment {
                *slot = community[*slot];
            }
            modularity = level.modularity(&community);
            level_modularities.push(modularity);
            levels += 1;
            debug!(
                level = levels,
                communities = count,
                modularity,
                passes = run.passes,
                "level finished"
            );
            self.progress
                .log_progress(levels as f64 / self.max_levels as f64);

            if !completed {
                break;
            }
            self.level = Some(level.coarsen(&community, count));
        }
        self.level = None;

        if completed {
            self.progress.log_done();
        }
        let communities = Communities::new(assignment, iterations, levels, modularity, level_modularities);
        info!(
            communities = communities.community_count(),
            iterations,
            levels,
            modularity,
            completed,
            "louvain finished"
        );
        Ok(Outcome {
            value: communities,
            completed,
        })
    }

    fn optimize(&self, level: &LevelGraph) -> LevelRun {
        let mut state = MoveState::singletons(level);
        let mut passes = 0;
        let mut moves = 0;
        while passes < self.max_iterations {
            if !self.termination.running() {
                return LevelRun {
                    state,
                    passes,
                    moves,
                    completed: false,
                };
            }
            let moved = match self.executor {
                Some(executor) => parallel_pass(level, &mut state, executor),
                None => sequential_pass(level, &mut state),
            };
            passes += 1;
            moves += moved;
            if moved == 0 {
                break;
            }
        }
        LevelRun {
            state,
            passes,
            moves,
            completed: true,
        }
    }

    /// Drop the current level graph.
    pub fn release(&mut self) {
        self.lifecycle.release();
        self.level = None;
    }
}

/// Community id per base node plus run statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Communities {
    assignment: Vec<usize>,
    community_count: usize,
    iterations: usize,
    levels: usize,
    modularity: f64,
    level_modularities: Vec<f64>,
}

impl Communities {
    fn new(
        assignment: Vec<usize>,
        iterations: usize,
        levels: usize,
        modularity: f64,
        level_modularities: Vec<f64>,
    ) -> Self {
        let community_count = assignment.iter().copied().max().map_or(0, |c| c + 1);
        Self {
            assignment,
            community_count,
            iterations,
            levels,
            modularity,
            level_modularities,
        }
    }

    #[must_use]
    pub fn community(&self, node: NodeId) -> usize {
        self.assignment[node]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.assignment
    }

    #[must_use]
    pub const fn community_count(&self) -> usize {
        self.community_count
    }

    /// Local-moving passes summed over all levels.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Levels that moved at least one node.
    #[must_use]
    pub const fn levels(&self) -> usize {
        self.levels
    }

    #[must_use]
    pub const fn modularity(&self) -> f64 {
        self.modularity
    }

    #[must_use]
    pub fn level_modularities(&self) -> &[f64] {
        &self.level_modularities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphalgo_core::termination::AtomicTerminationFlag;
    use graphalgo_core::{AnyGraph, EdgeListSource, GraphLoader};

    /// Two 4-cliques joined by a single bridge.
    fn barbell() -> AnyGraph {
        let mut source = EdgeListSource::new();
        for block in [0_u64, 4] {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    source.add_edge(block + i, block + j);
                }
            }
        }
        source.add_edge(3, 4);
        GraphLoader::default().load(&source).unwrap()
    }

    #[test]
    fn barbell_splits_in_two() {
        let graph = barbell();
        let communities = Louvain::builder(&graph).build().unwrap().compute().unwrap();
        assert!(communities.completed);
        let c = communities.value;
        assert_eq!(c.community_count(), 2);
        assert!((0..4).all(|n| c.community(n) == c.community(0)));
        assert!((4..8).all(|n| c.community(n) == c.community(4)));
        assert!(c.modularity() > 0.3);
        assert_eq!(c.level_modularities().last().copied(), Some(c.modularity()));
    }

    #[test]
    fn parallel_variant_agrees_on_barbell() {
        let graph = barbell();
        let executor = Executor::new(4).unwrap();
        let c = Louvain::builder(&graph)
            .executor(&executor)
            .build()
            .unwrap()
            .compute()
            .unwrap()
            .into_value();
        assert_eq!(c.community_count(), 2);
        assert_ne!(c.community(0), c.community(7));
    }

    #[test]
    fn edgeless_graph_keeps_singletons() {
        let mut source = EdgeListSource::new();
        source.add_node(1).add_node(2).add_node(3);
        let graph = GraphLoader::default().load(&source).unwrap();
        let c = Louvain::builder(&graph).build().unwrap().compute().unwrap().into_value();
        assert_eq!(c.community_count(), 3);
        assert_eq!(c.levels(), 0);
        assert_eq!(c.iterations(), 1);
    }

    #[test]
    fn weighted_requires_weights() {
        let graph = barbell();
        assert!(matches!(
            Louvain::builder(&graph).weighted(true).build().err(),
            Some(GraphError::MissingWeights { .. })
        ));
        assert!(matches!(
            Louvain::builder(&graph).max_iterations(0).build().err(),
            Some(GraphError::Config { .. })
        ));
    }

    #[test]
    fn terminated_run_returns_singletons() {
        let graph = barbell();
        let flag = AtomicTerminationFlag::new();
        flag.terminate();
        let outcome = Louvain::builder(&graph)
            .termination(&flag)
            .build()
            .unwrap()
            .compute()
            .unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.value.community_count(), 8);
        assert_eq!(outcome.value.iterations(), 0);
    }

    #[test]
    fn single_use() {
        let graph = barbell();
        let mut louvain = Louvain::builder(&graph).build().unwrap();
        louvain.compute().unwrap();
        assert!(matches!(louvain.compute(), Err(GraphError::AlreadyComputed(_))));
    }
}
