//! Single-source shortest paths (Dijkstra).
//!
//! Costs are summed relationship weights. A binary heap with lazy deletion
//! holds tentative distances; a node is finalized the first time it is
//! popped. Candidates of equal cost pop in the order they were pushed, and
//! predecessors change only on strict improvement, so among equal-cost
//! routes the first one discovered wins.
//!
//! With [`Target::Node`] the search stops as soon as the target is
//! finalized. Unreachable targets are a normal result: the cost stays
//! [`UNREACHABLE`] and the path is empty.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use graphalgo_core::progress::{NoopProgress, ProgressLogger};
use graphalgo_core::termination::{RunningTrue, TerminationFlag};
use graphalgo_core::{Direction, Graph, GraphError, Lifecycle, NodeId, Outcome, UNREACHABLE};
use tracing::{debug, instrument};

const NAME: &str = "ShortestPathDijkstra";

/// Heap pops between progress reports.
const PROGRESS_INTERVAL: usize = 4096;

/// Where the search may stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    Node(NodeId),
    /// Settle every reachable node.
    #[default]
    All,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    /// Push order.
    sequence: u64,
    node: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so `BinaryHeap` pops the cheapest candidate first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub struct ShortestPathDijkstraBuilder<'a, G> {
    graph: &'a G,
    source: NodeId,
    target: Target,
    direction: Direction,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
}

impl<'a, G: Graph> ShortestPathDijkstraBuilder<'a, G> {
    #[must_use]
    pub const fn source(mut self, source: NodeId) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub const fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

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

    /// # Errors
    ///
    /// [`GraphError::MissingWeights`] when the graph was loaded without
    /// weights, [`GraphError::UnknownNode`] for an out-of-range source or
    /// target.
    pub fn build(self) -> Result<ShortestPathDijkstra<'a, G>, GraphError> {
        if !self.graph.has_relationship_weights() {
            return Err(GraphError::MissingWeights { algorithm: NAME });
        }
        let node_count = self.graph.node_count();
        let check = |node: NodeId| {
            if node < node_count {
                Ok(())
            } else {
                Err(GraphError::UnknownNode { node, node_count })
            }
        };
        check(self.source)?;
        if let Target::Node(target) = self.target {
            check(target)?;
        }
        Ok(ShortestPathDijkstra {
            graph: self.graph,
            source: self.source,
            target: self.target,
            direction: self.direction,
            termination: self.termination,
            progress: self.progress,
            lifecycle: Lifecycle::default(),
            queue: BinaryHeap::new(),
            finalized: FixedBitSet::with_capacity(node_count),
        })
    }
}

/// Single-use Dijkstra run over a shared graph.
pub struct ShortestPathDijkstra<'a, G> {
    graph: &'a G,
    source: NodeId,
    target: Target,
    direction: Direction,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
    lifecycle: Lifecycle,
    queue: BinaryHeap<Candidate>,
    finalized: FixedBitSet,
}

impl<'a, G: Graph> ShortestPathDijkstra<'a, G> {
    #[must_use]
    pub fn builder(graph: &'a G) -> ShortestPathDijkstraBuilder<'a, G> {
        ShortestPathDijkstraBuilder {
            graph,
            source: 0,
            target: Target::All,
            direction: Direction::Outgoing,
            termination: &RunningTrue,
            progress: &NoopProgress,
        }
    }

    /// # Errors
    ///
    /// [`GraphError::AlreadyComputed`] or [`GraphError::Released`] when the
    /// instance was already used.
    #[instrument(skip(self), fields(source = self.source, target = ?self.target, direction = %self.direction))]
    pub fn compute(&mut self) -> Result<Outcome<ShortestPaths>, GraphError> {
        self.lifecycle.begin_compute(NAME)?;

        let graph = self.graph;
        let node_count = graph.node_count();
        let mut costs = vec![UNREACHABLE; node_count];
        let mut predecessors: Vec<Option<NodeId>> = vec![None; node_count];
        let target = match self.target {
            Target::Node(t) => Some(t),
            Target::All => None,
        };

        costs[self.source] = 0.0;
        let mut pushed = 0_u64;
        self.queue.push(Candidate {
            cost: 0.0,
            sequence: pushed,
            node: self.source,
        });

        let mut pops = 0_usize;
        let mut completed = true;
        while let Some(Candidate { cost, node, .. }) = self.queue.pop() {
            if !self.termination.running() {
                completed = false;
                break;
            }
            if self.finalized.put(node) {
                continue;
            }
            if Some(node) == target {
                break;
            }

            graph.for_each_relationship(node, self.direction, |_, neighbor, relationship| {
                if self.finalized.contains(neighbor) {
                    return true;
                }
                let weight = graph.relationship_weight(relationship);
                if weight >= UNREACHABLE {
                    return true;
                }
                let candidate = cost + weight;
                if candidate < costs[neighbor] {
                    costs[neighbor] = candidate;
                    predecessors[neighbor] = Some(node);
                    pushed += 1;
                    self.queue.push(Candidate {
                        cost: candidate,
                        sequence: pushed,
                        node: neighbor,
                    });
                }
                true
            });

            pops += 1;
            if pops % PROGRESS_INTERVAL == 0 {
                self.progress
                    .log_progress(self.finalized.count_ones(..) as f64 / node_count as f64);
            }
        }
        if completed {
            self.progress.log_done();
        }

        let settled = std::mem::replace(&mut self.finalized, FixedBitSet::new());
        self.queue.clear();
        debug!(settled = settled.count_ones(..), completed, "dijkstra finished");

        Ok(Outcome {
            value: ShortestPaths {
                source: self.source,
                target,
                costs,
                predecessors,
                settled,
            },
            completed,
        })
    }

    /// Drop the heap and finalized set.
    pub fn release(&mut self) {
        self.lifecycle.release();
        self.queue = BinaryHeap::new();
        self.finalized = FixedBitSet::new();
    }
}

/// Distances and predecessor tree from one source.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: NodeId,
    target: Option<NodeId>,
    costs: Vec<f64>,
    predecessors: Vec<Option<NodeId>>,
    settled: FixedBitSet,
}

impl ShortestPaths {
    #[must_use]
    pub const fn source(&self) -> NodeId {
        self.source
    }

    /// Cost to the requested target; [`UNREACHABLE`] when unreachable or
    /// when the search ran to all nodes.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.target.map_or(UNREACHABLE, |t| self.costs[t])
    }

    /// Path to the requested target.
    #[must_use]
    pub fn path(&self) -> ShortestPath<'_> {
        self.target
            .map_or_else(|| ShortestPath::empty(&self.costs), |t| self.path_to(t))
    }

    /// Path from the source to `node` along the predecessor tree.
    ///
    /// Empty unless `node` was finalized.
    #[must_use]
    pub fn path_to(&self, node: NodeId) -> ShortestPath<'_> {
        if !self.is_settled(node) {
            return ShortestPath::empty(&self.costs);
        }
        let mut nodes = vec![node];
        let mut current = node;
        while let Some(previous) = self.predecessors[current] {
            nodes.push(previous);
            current = previous;
        }
        nodes.reverse();
        ShortestPath {
            nodes,
            total_cost: self.costs[node],
            costs: &self.costs,
        }
    }

    /// Tentative or final distance; [`UNREACHABLE`] if never reached.
    #[must_use]
    pub fn distance(&self, node: NodeId) -> f64 {
        self.costs.get(node).copied().unwrap_or(UNREACHABLE)
    }

    #[must_use]
    pub fn is_settled(&self, node: NodeId) -> bool {
        node < self.costs.len() && self.settled.contains(node)
    }

    /// Mapped-id-indexed predecessor table.
    #[must_use]
    pub fn predecessors(&self) -> &[Option<NodeId>] {
        &self.predecessors
    }

    /// Mapped-id-indexed distance table.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.costs
    }
}

/// Ordered node sequence from source to target.
#[derive(Debug, Clone)]
pub struct ShortestPath<'r> {
    nodes: Vec<NodeId>,
    total_cost: f64,
    costs: &'r [f64],
}

impl<'r> ShortestPath<'r> {
    const fn empty(costs: &'r [f64]) -> Self {
        Self {
            nodes: Vec::new(),
            total_cost: UNREACHABLE,
            costs,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `(node, distance from source)` along the path.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.nodes.iter().map(|&n| (n, self.costs[n]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphalgo_core::termination::AtomicTerminationFlag;
    use graphalgo_core::{AnyGraph, EdgeListSource, GraphLoader, LoadConfig};

    fn load(edges: &[(u64, u64, f64)]) -> AnyGraph {
        let mut source = EdgeListSource::new();
        for &(s, t, w) in edges {
            source.add_weighted_edge(s, t, w);
        }
        GraphLoader::new(LoadConfig::default().weighted(None))
            .load(&source)
            .unwrap()
    }

    #[test]
    fn unweighted_graph_is_rejected() {
        let mut source = EdgeListSource::new();
        source.add_edge(1, 2);
        let graph = GraphLoader::default().load(&source).unwrap();
        let err = ShortestPathDijkstra::builder(&graph).build().err().unwrap();
        assert!(matches!(err, GraphError::MissingWeights { .. }));
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let graph = load(&[(1, 2, 1.0)]);
        let err = ShortestPathDijkstra::builder(&graph)
            .target(Target::Node(9))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::UnknownNode { node: 9, .. }));
    }

    #[test]
    fn ties_keep_first_discovered_predecessor() {
        // 0 -> 1 -> 3 and 0 -> 2 -> 3, both cost 2.
        let graph = load(&[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)]);
        let mut dijkstra = ShortestPathDijkstra::builder(&graph)
            .target(Target::Node(3))
            .build()
            .unwrap();
        let paths = dijkstra.compute().unwrap().into_value();
        assert_eq!(paths.path().nodes(), &[0, 1, 3]);
        assert!((paths.total_cost() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_costs_settle_in_discovery_order() {
        // 0 reaches 2 before 1 at the same cost, so 2 is expanded first and
        // claims 3 even though 1 has the lower id.
        let mut source = EdgeListSource::new();
        for node in 0..4 {
            source.add_node(node);
        }
        source
            .add_weighted_edge(0, 2, 1.0)
            .add_weighted_edge(0, 1, 1.0)
            .add_weighted_edge(2, 3, 1.0)
            .add_weighted_edge(1, 3, 1.0);
        let graph = GraphLoader::new(LoadConfig::default().weighted(None))
            .load(&source)
            .unwrap();
        let mut dijkstra = ShortestPathDijkstra::builder(&graph).build().unwrap();
        let paths = dijkstra.compute().unwrap().into_value();
        assert_eq!(paths.path_to(3).nodes(), &[0, 2, 3]);
        assert_eq!(paths.predecessors()[3], Some(2));
    }

    #[test]
    fn unreachable_target_is_empty_path() {
        let graph = load(&[(0, 1, 1.0), (2, 1, 1.0)]);
        let mut dijkstra = ShortestPathDijkstra::builder(&graph)
            .target(Target::Node(2))
            .build()
            .unwrap();
        let outcome = dijkstra.compute().unwrap();
        assert!(outcome.completed);
        assert!(outcome.value.path().is_empty());
        assert_eq!(outcome.value.total_cost(), UNREACHABLE);
    }

    #[test]
    fn incoming_direction_walks_edges_backwards() {
        let graph = load(&[(0, 1, 2.0), (1, 2, 3.0)]);
        let mut dijkstra = ShortestPathDijkstra::builder(&graph)
            .source(2)
            .target(Target::Node(0))
            .direction(Direction::Incoming)
            .build()
            .unwrap();
        let paths = dijkstra.compute().unwrap().into_value();
        assert_eq!(paths.path().nodes(), &[2, 1, 0]);
        assert!((paths.total_cost() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sentinel_weights_are_not_traversed() {
        let graph = load(&[(0, 1, UNREACHABLE), (0, 2, 1.0), (2, 1, 1.0)]);
        let mut dijkstra = ShortestPathDijkstra::builder(&graph).build().unwrap();
        let paths = dijkstra.compute().unwrap().into_value();
        assert!((paths.distance(1) - 2.0).abs() < f64::EPSILON);
        assert_eq!(paths.path_to(1).nodes(), &[0, 2, 1]);
    }

    #[test]
    fn second_compute_and_released_compute_fail() {
        let graph = load(&[(0, 1, 1.0)]);
        let mut dijkstra = ShortestPathDijkstra::builder(&graph).build().unwrap();
        dijkstra.compute().unwrap();
        assert!(matches!(dijkstra.compute(), Err(GraphError::AlreadyComputed(_))));

        let mut released = ShortestPathDijkstra::builder(&graph).build().unwrap();
        released.release();
        assert!(matches!(released.compute(), Err(GraphError::Released(_))));
    }

    #[test]
    fn terminated_run_is_partial() {
        let graph = load(&[(0, 1, 1.0), (1, 2, 1.0)]);
        let flag = AtomicTerminationFlag::new();
        flag.terminate();
        let mut dijkstra = ShortestPathDijkstra::builder(&graph)
            .termination(&flag)
            .build()
            .unwrap();
        let outcome = dijkstra.compute().unwrap();
        assert!(!outcome.completed);
        assert!(!outcome.value.is_settled(0));
        assert_eq!(outcome.value.distance(0), 0.0);
    }
}
