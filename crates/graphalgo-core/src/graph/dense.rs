//! Array-backed adjacency.
//!
//! Outgoing relationships are stored in compressed-sparse-row form: node `n`
//! owns `out_targets[out_offsets[n]..out_offsets[n + 1]]`, and the position
//! inside `out_targets` is the relationship id. Incoming relationships use the
//! same layout plus a parallel array of relationship ids so both directions
//! resolve to the same weight. All arrays are `u32`, which caps node and
//! relationship counts at [`DENSE_CAPACITY`].

use std::sync::Arc;

use crate::direction::Direction;
use crate::error::GraphError;
use crate::graph::{Graph, NodeId, RelationshipId, Weights};
use crate::ids::IdMap;
use crate::loader::{AdjacencyBuilder, WeightPlan};

/// Largest node or relationship count the dense backend accepts.
pub const DENSE_CAPACITY: u64 = i32::MAX as u64;

#[derive(Debug)]
struct DenseAdjacency {
    ids: IdMap,
    out_offsets: Vec<u32>,
    out_targets: Vec<u32>,
    in_offsets: Vec<u32>,
    in_sources: Vec<u32>,
    in_relationships: Vec<u32>,
    weights: Weights<Vec<f64>>,
}

/// Flat-array graph; cloning or [`Graph::concurrent_copy`] shares the arrays.
#[derive(Debug, Clone)]
pub struct DenseGraph {
    inner: Arc<DenseAdjacency>,
}

#[inline]
fn csr_range(offsets: &[u32], node: NodeId) -> std::ops::Range<usize> {
    offsets[node] as usize..offsets[node + 1] as usize
}

impl DenseGraph {
    /// Approximate heap usage of the adjacency and weight arrays.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        let a = &*self.inner;
        let u32s = a.out_offsets.len()
            + a.out_targets.len()
            + a.in_offsets.len()
            + a.in_sources.len()
            + a.in_relationships.len();
        let weights = match &a.weights {
            Weights::Table(table) => table.len() * std::mem::size_of::<f64>(),
            Weights::Absent | Weights::Uniform(_) => 0,
        };
        u32s * std::mem::size_of::<u32>() + weights
    }
}

impl Graph for DenseGraph {
    fn backend(&self) -> &'static str {
        "dense"
    }

    fn node_count(&self) -> usize {
        self.inner.ids.node_count()
    }

    fn relationship_count(&self) -> u64 {
        self.inner.out_targets.len() as u64
    }

    fn id_map(&self) -> &IdMap {
        &self.inner.ids
    }

    fn degree(&self, node: NodeId, direction: Direction) -> usize {
        let a = &*self.inner;
        let mut degree = 0;
        if direction.includes_outgoing() {
            degree += csr_range(&a.out_offsets, node).len();
        }
        if direction.includes_incoming() {
            degree += csr_range(&a.in_offsets, node).len();
        }
        degree
    }

    fn for_each_relationship<F>(&self, node: NodeId, direction: Direction, mut visitor: F)
    where
        F: FnMut(NodeId, NodeId, RelationshipId) -> bool,
    {
        let a = &*self.inner;
        if direction.includes_outgoing() {
            for relationship in csr_range(&a.out_offsets, node) {
                let target = a.out_targets[relationship] as NodeId;
                if !visitor(node, target, relationship as RelationshipId) {
                    return;
                }
            }
        }
        if direction.includes_incoming() {
            for entry in csr_range(&a.in_offsets, node) {
                let other = a.in_sources[entry] as NodeId;
                let relationship = RelationshipId::from(a.in_relationships[entry]);
                if !visitor(node, other, relationship) {
                    return;
                }
            }
        }
    }

    fn has_relationship_weights(&self) -> bool {
        self.inner.weights.is_present()
    }

    fn relationship_weight(&self, relationship: RelationshipId) -> f64 {
        self.inner.weights.get(relationship)
    }

    fn concurrent_copy(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates outgoing lists in mapped order, then derives the incoming side.
#[derive(Debug)]
pub(crate) struct DenseBuilder {
    out_offsets: Vec<u32>,
    out_targets: Vec<u32>,
    weights: Option<Vec<f64>>,
}

impl DenseBuilder {
    pub(crate) fn new(node_count: usize, store_weights: bool) -> Self {
        let mut out_offsets = Vec::with_capacity(node_count + 1);
        out_offsets.push(0);
        Self {
            out_offsets,
            out_targets: Vec::new(),
            weights: store_weights.then(Vec::new),
        }
    }
}

impl AdjacencyBuilder for DenseBuilder {
    type Output = DenseGraph;

    const BACKEND: &'static str = "dense";
    const CAPACITY: u64 = DENSE_CAPACITY;

    fn push_node(&mut self, targets: &[NodeId], weights: &[f64]) -> Result<(), GraphError> {
        let total = self.out_targets.len() as u64 + targets.len() as u64;
        if total > DENSE_CAPACITY {
            return Err(GraphError::Capacity {
                backend: Self::BACKEND,
                what: "relationship",
                requested: total,
                capacity: DENSE_CAPACITY,
            });
        }
        self.out_targets.extend(targets.iter().map(|&t| t as u32));
        if let Some(table) = self.weights.as_mut() {
            table.extend_from_slice(weights);
        }
        self.out_offsets.push(total as u32);
        Ok(())
    }

    fn finish(self, ids: IdMap, plan: WeightPlan) -> DenseGraph {
        let node_count = ids.node_count();
        let Self {
            out_offsets,
            out_targets,
            weights,
        } = self;

        let mut in_offsets = vec![0_u32; node_count + 1];
        for &target in &out_targets {
            in_offsets[target as usize + 1] += 1;
        }
        for i in 0..node_count {
            in_offsets[i + 1] += in_offsets[i];
        }

        let mut cursor: Vec<u32> = in_offsets[..node_count].to_vec();
        let mut in_sources = vec![0_u32; out_targets.len()];
        let mut in_relationships = vec![0_u32; out_targets.len()];
        for source in 0..node_count {
            for relationship in csr_range(&out_offsets, source) {
                let target = out_targets[relationship] as usize;
                let slot = cursor[target] as usize;
                cursor[target] += 1;
                in_sources[slot] = source as u32;
                in_relationships[slot] = relationship as u32;
            }
        }

        let weights = match (plan, weights) {
            (WeightPlan::Table, Some(table)) => Weights::Table(table),
            (WeightPlan::Uniform(weight), _) => Weights::Uniform(weight),
            (WeightPlan::Absent | WeightPlan::Table, _) => Weights::Absent,
        };

        DenseGraph {
            inner: Arc::new(DenseAdjacency {
                ids,
                out_offsets,
                out_targets,
                in_offsets,
                in_sources,
                in_relationships,
                weights,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> DenseGraph {
        // 0 -> 1, 0 -> 2, 1 -> 2 with weights 1, 2, 3
        let mut ids = IdMap::default();
        for original in [10, 20, 30] {
            ids.add(original).unwrap();
        }
        let mut builder = DenseBuilder::new(3, true);
        builder.push_node(&[1, 2], &[1.0, 2.0]).unwrap();
        builder.push_node(&[2], &[3.0]).unwrap();
        builder.push_node(&[], &[]).unwrap();
        builder.finish(ids, WeightPlan::Table)
    }

    fn neighbors(graph: &DenseGraph, node: NodeId, direction: Direction) -> Vec<(NodeId, u64)> {
        let mut out = Vec::new();
        graph.for_each_relationship(node, direction, |source, target, relationship| {
            assert_eq!(source, node);
            out.push((target, relationship));
            true
        });
        out
    }

    #[test]
    fn outgoing_and_incoming_lists() {
        let g = triangle();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.relationship_count(), 3);
        assert_eq!(neighbors(&g, 0, Direction::Outgoing), vec![(1, 0), (2, 1)]);
        assert_eq!(neighbors(&g, 2, Direction::Incoming), vec![(0, 1), (1, 2)]);
        assert_eq!(
            neighbors(&g, 1, Direction::Both),
            vec![(2, 2), (0, 0)],
            "both = outgoing then incoming"
        );
    }

    #[test]
    fn incoming_relationship_ids_resolve_same_weight() {
        let g = triangle();
        let incoming = neighbors(&g, 2, Direction::Incoming);
        let weights: Vec<f64> = incoming
            .iter()
            .map(|&(_, rel)| g.relationship_weight(rel))
            .collect();
        assert_eq!(weights, vec![2.0, 3.0]);
        assert_eq!(g.relationship_weight_between(1, 2), Some(3.0));
        assert_eq!(g.relationship_weight_between(2, 1), None);
    }

    #[test]
    fn visitor_false_stops_both_halves() {
        let g = triangle();
        let mut visited = 0;
        g.for_each_relationship(1, Direction::Both, |_, _, _| {
            visited += 1;
            false
        });
        assert_eq!(visited, 1);
    }

    #[test]
    fn concurrent_copy_shares_arrays() {
        let g = triangle();
        let copy = g.concurrent_copy();
        assert!(Arc::ptr_eq(&g.inner, &copy.inner));
        assert_eq!(copy.degree(0, Direction::Both), 2);
    }
}
