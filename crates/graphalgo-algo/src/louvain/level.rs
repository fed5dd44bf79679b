//! Symmetric weighted adjacency for one Louvain level.
//!
//! Built from the base graph with [`Direction::Both`], so a directed
//! relationship `u -> v` appears in both rows and the matrix is symmetric.
//! Self-loops are kept apart from the rows; a base self-loop is seen from
//! both of its ends and therefore contributes twice its weight, the usual
//! `A_ii` convention for modularity.

use graphalgo_core::{Direction, Executor, Graph, NodeId};
use rayon::prelude::*;

type Row = Vec<(NodeId, f64)>;

#[derive(Debug, Clone, Default)]
pub(crate) struct LevelGraph {
    offsets: Vec<usize>,
    targets: Vec<NodeId>,
    weights: Vec<f64>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    /// `2m`: sum of all degrees.
    total_weight: f64,
}

impl LevelGraph {
    /// Read the base graph. Rows are collected in parallel when an executor
    /// is supplied, one [`Graph::concurrent_copy`] per worker.
    pub(crate) fn from_graph<G: Graph>(
        graph: &G,
        weighted: bool,
        executor: Option<&Executor>,
    ) -> Self {
        let n = graph.node_count();
        let read_row = |g: &G, node: NodeId| -> (Row, f64) {
            let mut row = Vec::with_capacity(g.degree(node, Direction::Both));
            let mut self_loop = 0.0;
            g.for_each_relationship(node, Direction::Both, |_, other, relationship| {
                let weight = if weighted {
                    g.relationship_weight(relationship)
                } else {
                    1.0
                };
                if other == node {
                    self_loop += weight;
                } else {
                    row.push((other, weight));
                }
                true
            });
            (row, self_loop)
        };

        let rows: Vec<(Row, f64)> = match executor {
            Some(executor) => executor.install(|| {
                (0..n)
                    .into_par_iter()
                    .map_init(|| graph.concurrent_copy(), |copy, node| read_row(copy, node))
                    .collect()
            }),
            None => (0..n).map(|node| read_row(graph, node)).collect(),
        };
        Self::from_rows(rows)
    }

    fn from_rows(rows: Vec<(Row, f64)>) -> Self {
        let n = rows.len();
        let entries = rows.iter().map(|(row, _)| row.len()).sum();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::with_capacity(entries);
        let mut weights = Vec::with_capacity(entries);
        let mut self_loops = Vec::with_capacity(n);
        let mut degrees = Vec::with_capacity(n);
        offsets.push(0);
        for (row, self_loop) in rows {
            let mut degree = self_loop;
            for (target, weight) in row {
                targets.push(target);
                weights.push(weight);
                degree += weight;
            }
            offsets.push(targets.len());
            self_loops.push(self_loop);
            degrees.push(degree);
        }
        let total_weight = degrees.iter().sum();
        Self {
            offsets,
            targets,
            weights,
            self_loops,
            degrees,
            total_weight,
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.degrees.len()
    }

    /// Weighted degree `k_i`, self-loop included.
    #[inline]
    pub(crate) fn degree(&self, node: NodeId) -> f64 {
        self.degrees[node]
    }

    pub(crate) const fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Off-diagonal `(neighbor, weight)` entries; parallel entries are not
    /// merged at the base level.
    #[inline]
    pub(crate) fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let range = self.offsets[node]..self.offsets[node + 1];
        self.targets[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// `Q = sum_c [ in_c / 2m - (tot_c / 2m)^2 ]`.
    pub(crate) fn modularity(&self, community: &[usize]) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let count = community.iter().copied().max().map_or(0, |c| c + 1);
        let mut inside = vec![0.0; count];
        let mut total = vec![0.0; count];
        for node in 0..self.node_count() {
            let c = community[node];
            total[c] += self.degrees[node];
            inside[c] += self.self_loops[node];
            for (other, weight) in self.neighbors(node) {
                if community[other] == c {
                    inside[c] += weight;
                }
            }
        }
        let m2 = self.total_weight;
        inside
            .iter()
            .zip(&total)
            .map(|(&i, &t)| i / m2 - (t / m2) * (t / m2))
            .sum()
    }

    /// Collapse each community into one super-node. Edge weights between
    /// communities are summed; intra-community weight becomes a self-loop.
    ///
    /// `community` must hold dense ids in `[0, count)`.
    pub(crate) fn coarsen(&self, community: &[usize], count: usize) -> Self {
        let mut rows: Vec<(Row, f64)> = vec![(Vec::new(), 0.0); count];
        for node in 0..self.node_count() {
            let c = community[node];
            rows[c].1 += self.self_loops[node];
            for (other, weight) in self.neighbors(node) {
                let d = community[other];
                if d == c {
                    rows[c].1 += weight;
                } else {
                    rows[c].0.push((d, weight));
                }
            }
        }
        for (row, _) in &mut rows {
            row.sort_unstable_by_key(|&(target, _)| target);
            row.dedup_by(|next, kept| {
                if next.0 == kept.0 {
                    kept.1 += next.1;
                    true
                } else {
                    false
                }
            });
        }
        Self::from_rows(rows)
    }
}

/// Renumber community ids to `[0, count)` in order of first appearance.
pub(crate) fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = vec![usize::MAX; community.len()];
    let mut next = 0;
    let dense = community
        .iter()
        .map(|&c| {
            if mapping[c] == usize::MAX {
                mapping[c] = next;
                next += 1;
            }
            mapping[c]
        })
        .collect();
    (dense, next)
}
