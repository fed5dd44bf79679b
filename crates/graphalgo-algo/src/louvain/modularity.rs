//! Modularity and the local-moving phase.
//!
//! The gain of moving node `i` (already removed from its community) into
//! community `C` is, up to the constant factor `1 / m`:
//!
//! ```text
//! k_i,in(C) - tot(C) * k_i / 2m
//! ```
//!
//! where `k_i,in(C)` is the weight between `i` and `C`, `tot(C)` the summed
//! degree of `C`, and `k_i` the degree of `i`. Staying put is scored the same
//! way against the node's own community, and only a strictly better target
//! causes a move.

use graphalgo_core::{Executor, Graph, GraphError, NodeId};
use rayon::prelude::*;

use super::level::LevelGraph;

/// Relative slack below which two gains count as equal.
const GAIN_EPSILON: f64 = 1e-12;

/// Modularity of `assignment` over the symmetric view of `graph`.
///
/// `weighted` selects relationship weights or unit weights.
///
/// # Errors
///
/// [`GraphError::Config`] when `assignment` does not cover every node or
/// uses a community id of `node_count` or more, and
/// [`GraphError::MissingWeights`] for a weighted call on an unweighted graph.
pub fn modularity<G: Graph>(
    graph: &G,
    assignment: &[usize],
    weighted: bool,
) -> Result<f64, GraphError> {
    if assignment.len() != graph.node_count() {
        return Err(GraphError::Config {
            reason: format!(
                "assignment covers {} nodes, graph has {}",
                assignment.len(),
                graph.node_count()
            ),
        });
    }
    if let Some((node, &community)) = assignment
        .iter()
        .enumerate()
        .find(|&(_, &c)| c >= assignment.len())
    {
        return Err(GraphError::Config {
            reason: format!(
                "node {node} has community {community}, ids must be below {}",
                assignment.len()
            ),
        });
    }
    if weighted && !graph.has_relationship_weights() {
        return Err(GraphError::MissingWeights {
            algorithm: "modularity",
        });
    }
    let level = LevelGraph::from_graph(graph, weighted, None);
    Ok(level.modularity(assignment))
}

/// Assignment plus the per-community aggregates the gain formula needs.
#[derive(Debug, Clone)]
pub(crate) struct MoveState {
    pub(crate) community: Vec<usize>,
    total: Vec<f64>,
    size: Vec<usize>,
}

impl MoveState {
    /// Every node in its own community.
    pub(crate) fn singletons(level: &LevelGraph) -> Self {
        let n = level.node_count();
        Self {
            community: (0..n).collect(),
            total: (0..n).map(|node| level.degree(node)).collect(),
            size: vec![1; n],
        }
    }

    fn relocate(&mut self, node: NodeId, target: usize, degree: f64) {
        let source = self.community[node];
        self.total[source] -= degree;
        self.size[source] -= 1;
        self.total[target] += degree;
        self.size[target] += 1;
        self.community[node] = target;
    }
}

/// Sparse per-community weight accumulator reused across nodes.
#[derive(Debug)]
struct NeighborWeights {
    weight: Vec<f64>,
    seen: Vec<bool>,
    touched: Vec<usize>,
}

impl NeighborWeights {
    fn new(communities: usize) -> Self {
        Self {
            weight: vec![0.0; communities],
            seen: vec![false; communities],
            touched: Vec::new(),
        }
    }

    fn add(&mut self, community: usize, weight: f64) {
        if !self.seen[community] {
            self.seen[community] = true;
            self.touched.push(community);
        }
        self.weight[community] += weight;
    }

    fn clear(&mut self) {
        for &c in &self.touched {
            self.weight[c] = 0.0;
            self.seen[c] = false;
        }
        self.touched.clear();
    }
}

/// Best community for `node` against `state` (which still counts `node` in
/// its current community).
fn best_community(
    level: &LevelGraph,
    state: &MoveState,
    node: NodeId,
    scratch: &mut NeighborWeights,
) -> usize {
    let current = state.community[node];
    let degree = level.degree(node);
    let m2 = level.total_weight();
    if m2 <= 0.0 {
        return current;
    }

    scratch.clear();
    for (other, weight) in level.neighbors(node) {
        scratch.add(state.community[other], weight);
    }

    let epsilon = GAIN_EPSILON * m2;
    let own_total = state.total[current] - degree;
    let mut best = current;
    let mut best_gain = scratch.weight[current] - own_total * degree / m2;
    for &candidate in &scratch.touched {
        if candidate == current {
            continue;
        }
        let gain = scratch.weight[candidate] - state.total[candidate] * degree / m2;
        if gain > best_gain + epsilon {
            best = candidate;
            best_gain = gain;
        }
    }
    best
}

/// One in-place sweep over all nodes in id order. Returns the number of
/// moved nodes.
pub(crate) fn sequential_pass(level: &LevelGraph, state: &mut MoveState) -> usize {
    let mut scratch = NeighborWeights::new(level.node_count());
    let mut moves = 0;
    for node in 0..level.node_count() {
        let target = best_community(level, state, node, &mut scratch);
        if target != state.community[node] {
            state.relocate(node, target, level.degree(node));
            moves += 1;
        }
    }
    moves
}

/// One synchronized sweep: the node range is split into one partition per
/// worker, every worker proposes moves against the state as of pass start,
/// and proposals are applied after all workers finish.
///
/// Two singleton communities could otherwise swap into each other forever,
/// so a singleton only joins another singleton with a lower id. If the
/// applied moves lower modularity the pass is rolled back and reports zero
/// moves.
pub(crate) fn parallel_pass(
    level: &LevelGraph,
    state: &mut MoveState,
    executor: &Executor,
) -> usize {
    let n = level.node_count();
    if n == 0 {
        return 0;
    }
    let partitions = executor.concurrency().min(n);
    let chunk = n.div_ceil(partitions);
    let snapshot: &MoveState = state;

    let proposals: Vec<Vec<(NodeId, usize)>> = executor.install(|| {
        (0..partitions)
            .into_par_iter()
            .map(|partition| {
                let mut scratch = NeighborWeights::new(n);
                let start = partition * chunk;
                let end = (start + chunk).min(n);
                let mut moves = Vec::new();
                for node in start..end {
                    let current = snapshot.community[node];
                    let target = best_community(level, snapshot, node, &mut scratch);
                    let singleton_swap = snapshot.size[current] == 1
                        && snapshot.size[target] == 1
                        && target > current;
                    if target != current && !singleton_swap {
                        moves.push((node, target));
                    }
                }
                moves
            })
            .collect()
    });

    let moves: usize = proposals.iter().map(Vec::len).sum();
    if moves == 0 {
        return 0;
    }

    let before = level.modularity(&state.community);
    let previous = state.clone();
    for (node, target) in proposals.into_iter().flatten() {
        state.relocate(node, target, level.degree(node));
    }
    let after = level.modularity(&state.community);
    if after + GAIN_EPSILON < before {
        *state = previous;
        return 0;
    }
    moves
}
