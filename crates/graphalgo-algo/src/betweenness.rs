//! Betweenness centrality via Brandes' algorithm.
//!
//! # Algorithm
//!
//! For every source `s`:
//!
//! 1. BFS from `s` along the configured direction, counting shortest paths
//!    (`sigma`) and recording for each node its predecessors on shortest
//!    paths.
//! 2. Pop nodes in reverse discovery order and accumulate dependencies:
//!    `delta[v] += sigma[v] / sigma[w] * (1 + delta[w])` for each predecessor
//!    `v` of `w`.
//! 3. Add `delta[w]` to the centrality of every `w != s`.
//!
//! Complexity: O(V * E). Centrality is reset once per `compute`, never per
//! source.
//!
//! # Direction
//!
//! Under [`Direction::Both`] each unordered pair is reached from both ends,
//! so final scores are divided by 2. `Outgoing` and `Incoming` use a divisor
//! of 1. On a graph that stores every edge in both directions, `Both` sees
//! each neighbor twice. Dependencies stay those of `Outgoing`, so after the
//! divisor its scores come out at `(out + in) / 4`.
//!
//! # Cancellation
//!
//! The termination flag is polled at every queue pop and every stack pop. A
//! source interrupted mid-way contributes nothing; scores reflect only the
//! sources that finished.

use std::collections::VecDeque;

use graphalgo_core::progress::{NoopProgress, ProgressLogger};
use graphalgo_core::termination::{RunningTrue, TerminationFlag};
use graphalgo_core::{Direction, Graph, GraphError, Lifecycle, NodeId, Outcome};
use tracing::{debug, instrument};

const NAME: &str = "BetweennessCentrality";

pub struct BetweennessCentralityBuilder<'a, G> {
    graph: &'a G,
    direction: Direction,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
}

impl<'a, G: Graph> BetweennessCentralityBuilder<'a, G> {
    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
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

    #[must_use]
    pub fn build(self) -> BetweennessCentrality<'a, G> {
        let n = self.graph.node_count();
        BetweennessCentrality {
            graph: self.graph,
            direction: self.direction,
            termination: self.termination,
            progress: self.progress,
            lifecycle: Lifecycle::default(),
            work: Working::new(n),
        }
    }
}

/// Per-source scratch arrays, reused across sources.
#[derive(Debug, Default)]
struct Working {
    sigma: Vec<f64>,
    distance: Vec<i64>,
    delta: Vec<f64>,
    predecessors: Vec<Vec<NodeId>>,
    stack: Vec<NodeId>,
    queue: VecDeque<NodeId>,
}

impl Working {
    fn new(n: usize) -> Self {
        Self {
            sigma: vec![0.0; n],
            distance: vec![-1; n],
            delta: vec![0.0; n],
            predecessors: vec![Vec::new(); n],
            stack: Vec::with_capacity(n),
            queue: VecDeque::with_capacity(n),
        }
    }

    /// Reset only the entries touched by the previous source.
    fn reset(&mut self) {
        for &node in &self.stack {
            self.sigma[node] = 0.0;
            self.distance[node] = -1;
            self.delta[node] = 0.0;
            self.predecessors[node].clear();
        }
        self.stack.clear();
        self.queue.clear();
    }
}

/// Single-use Brandes run.
pub struct BetweennessCentrality<'a, G> {
    graph: &'a G,
    direction: Direction,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
    lifecycle: Lifecycle,
    work: Working,
}

impl<'a, G: Graph> BetweennessCentrality<'a, G> {
    #[must_use]
    pub fn builder(graph: &'a G) -> BetweennessCentralityBuilder<'a, G> {
        BetweennessCentralityBuilder {
            graph,
            direction: Direction::Outgoing,
            termination: &RunningTrue,
            progress: &NoopProgress,
        }
    }

    /// # Errors
    ///
    /// [`GraphError::AlreadyComputed`] or [`GraphError::Released`] when the
    /// instance was already used.
    #[instrument(skip(self), fields(direction = %self.direction, nodes = self.graph.node_count()))]
    pub fn compute(&mut self) -> Result<Outcome<Centrality>, GraphError> {
        self.lifecycle.begin_compute(NAME)?;

        let n = self.graph.node_count();
        let mut centrality = vec![0.0; n];
        let mut completed = true;

        for source in 0..n {
            if !self.single_source(source) {
                completed = false;
                break;
            }
            for &w in &self.work.stack {
                if w != source {
                    centrality[w] += self.work.delta[w];
                }
            }
            let fraction = if n > 1 {
                source as f64 / (n - 1) as f64
            } else {
                1.0
            };
            self.progress.log_progress(fraction);
        }

        let divisor = if self.direction == Direction::Both { 2.0 } else { 1.0 };
        if divisor > 1.0 {
            for score in &mut centrality {
                *score /= divisor;
            }
        }
        self.work.reset();
        debug!(completed, "betweenness finished");

        Ok(Outcome {
            value: Centrality { scores: centrality },
            completed,
        })
    }

    /// BFS plus back-propagation from one source. Returns `false` when
    /// terminated; `delta` is then incomplete and must not be committed.
    fn single_source(&mut self, source: NodeId) -> bool {
        let graph = self.graph;
        let direction = self.direction;
        let w = &mut self.work;
        w.reset();

        w.sigma[source] = 1.0;
        w.distance[source] = 0;
        w.queue.push_back(source);

        while let Some(node) = w.queue.pop_front() {
            if !self.termination.running() {
                return false;
            }
            w.stack.push(node);
            let next = w.distance[node] + 1;
            graph.for_each_relationship(node, direction, |_, neighbor, _| {
                if w.distance[neighbor] < 0 {
                    w.distance[neighbor] = next;
                    w.queue.push_back(neighbor);
                }
                if w.distance[neighbor] == next {
                    w.sigma[neighbor] += w.sigma[node];
                    w.predecessors[neighbor].push(node);
                }
                true
            });
        }

        // Walk the discovery order backwards without consuming it; the
        // caller reads `stack` to commit deltas.
        for index in (0..w.stack.len()).rev() {
            if !self.termination.running() {
                return false;
            }
            let node = w.stack[index];
            let coefficient = (1.0 + w.delta[node]) / w.sigma[node];
            for i in 0..w.predecessors[node].len() {
                let predecessor = w.predecessors[node][i];
                w.delta[predecessor] += w.sigma[predecessor] * coefficient;
            }
        }
        true
    }

    /// Drop all per-node working arrays.
    pub fn release(&mut self) {
        self.lifecycle.release();
        self.work = Working::default();
    }
}

/// Mapped-id-indexed centrality scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Centrality {
    scores: Vec<f64>,
}

impl Centrality {
    #[must_use]
    pub fn get(&self, node: NodeId) -> f64 {
        self.scores[node]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    /// `(node, score)` in mapped-id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.scores.iter().copied().enumerate()
    }

    /// Visit scores in mapped-id order until `visitor` returns `false`.
    pub fn for_each(&self, mut visitor: impl FnMut(NodeId, f64) -> bool) {
        for (node, &score) in self.scores.iter().enumerate() {
            if !visitor(node, score) {
                return;
            }
        }
    }

    /// Highest-scoring node; the lowest id wins ties.
    #[must_use]
    pub fn max(&self) -> Option<(NodeId, f64)> {
        self.iter()
            .fold(None, |best: Option<(NodeId, f64)>, (node, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((node, score)),
            })
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.scores.iter().sum()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.scores
    }
}
