//! Paged adjacency with compressed neighbor lists.
//!
//! Logically identical to [`crate::graph::DenseGraph`], physically built on
//! [`HugeArray`] pages so element counts are bounded by
//! [`HUGE_CAPACITY`] rather than by a `u32` index.
//!
//! Each node's neighbors are sorted and written as varint-encoded deltas
//! into one paged byte array. Per direction we keep:
//!
//! - `offsets[n]`: byte offset of node `n`'s encoded list,
//! - `first[n]`: logical index of node `n`'s first entry (`n + 1` entries, so
//!   the degree is `first[n + 1] - first[n]`).
//!
//! For outgoing lists the logical index is the relationship id. Incoming
//! entries map to relationship ids through `in_relationships`.

use std::sync::Arc;

use crate::direction::Direction;
use crate::error::GraphError;
use crate::graph::{Graph, NodeId, RelationshipId, Weights};
use crate::huge_array::{
    ByteCursor, HUGE_CAPACITY, HugeArray, HugeArrayBuilder, encode_vlong,
};
use crate::ids::IdMap;
use crate::loader::{AdjacencyBuilder, WeightPlan};

#[derive(Debug)]
struct CompressedAdjacency {
    offsets: HugeArray<u64>,
    first: HugeArray<u64>,
    bytes: HugeArray<u8>,
}

impl CompressedAdjacency {
    #[inline]
    fn degree(&self, node: NodeId) -> u64 {
        let node = node as u64;
        self.first.get(node + 1) - self.first.get(node)
    }

    /// Decode node's neighbors, calling `visit(neighbor, logical_index)`.
    /// Stops early and returns `false` when `visit` does.
    #[inline]
    fn for_each<F>(&self, node: NodeId, mut visit: F) -> bool
    where
        F: FnMut(NodeId, u64) -> bool,
    {
        let degree = self.degree(node);
        if degree == 0 {
            return true;
        }
        let first = self.first.get(node as u64);
        let mut cursor = ByteCursor::new(&self.bytes, self.offsets.get(node as u64));
        let mut previous = 0_u64;
        for k in 0..degree {
            previous += cursor.read_vlong();
            if !visit(previous as NodeId, first + k) {
                return false;
            }
        }
        true
    }

    fn size_in_bytes(&self) -> usize {
        self.offsets.size_in_bytes() + self.first.size_in_bytes() + self.bytes.size_in_bytes()
    }
}

/// Incrementally encodes sorted lists node by node.
#[derive(Debug, Default)]
struct CompressedAdjacencyBuilder {
    offsets: HugeArrayBuilder<u64>,
    first: HugeArrayBuilder<u64>,
    bytes: HugeArrayBuilder<u8>,
    entries: u64,
}

impl CompressedAdjacencyBuilder {
    /// `sorted` must be ascending.
    fn push_sorted(&mut self, sorted: impl IntoIterator<Item = u64>) {
        self.offsets.push(self.bytes.len());
        self.first.push(self.entries);
        let mut previous = 0_u64;
        for neighbor in sorted {
            encode_vlong(neighbor - previous, &mut self.bytes);
            previous = neighbor;
            self.entries += 1;
        }
    }

    fn build(mut self) -> CompressedAdjacency {
        self.first.push(self.entries);
        CompressedAdjacency {
            offsets: self.offsets.build(),
            first: self.first.build(),
            bytes: self.bytes.build(),
        }
    }
}

#[derive(Debug)]
struct HugeAdjacency {
    ids: IdMap,
    outgoing: CompressedAdjacency,
    incoming: CompressedAdjacency,
    in_relationships: HugeArray<u64>,
    weights: Weights<HugeArray<f64>>,
}

/// Paged graph; clones and concurrent copies share the pages.
#[derive(Debug, Clone)]
pub struct HugeGraph {
    inner: Arc<HugeAdjacency>,
}

impl HugeGraph {
    /// Approximate heap usage of adjacency pages and weights.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        let a = &*self.inner;
        let weights = match &a.weights {
            Weights::Table(table) => table.size_in_bytes(),
            Weights::Absent | Weights::Uniform(_) => 0,
        };
        a.outgoing.size_in_bytes()
            + a.incoming.size_in_bytes()
            + a.in_relationships.size_in_bytes()
            + weights
    }
}

impl Graph for HugeGraph {
    fn backend(&self) -> &'static str {
        "huge"
    }

    fn node_count(&self) -> usize {
        self.inner.ids.node_count()
    }

    fn relationship_count(&self) -> u64 {
        let outgoing = &self.inner.outgoing.first;
        if outgoing.is_empty() {
            0
        } else {
            outgoing.get(outgoing.len() - 1)
        }
    }

    fn id_map(&self) -> &IdMap {
        &self.inner.ids
    }

    fn degree(&self, node: NodeId, direction: Direction) -> usize {
        let a = &*self.inner;
        let mut degree = 0;
        if direction.includes_outgoing() {
            degree += a.outgoing.degree(node);
        }
        if direction.includes_incoming() {
            degree += a.incoming.degree(node);
        }
        degree as usize
    }

    fn for_each_relationship<F>(&self, node: NodeId, direction: Direction, mut visitor: F)
    where
        F: FnMut(NodeId, NodeId, RelationshipId) -> bool,
    {
        let a = &*self.inner;
        if direction.includes_outgoing()
            && !a
                .outgoing
                .for_each(node, |target, relationship| visitor(node, target, relationship))
        {
            return;
        }
        if direction.includes_incoming() {
            a.incoming.for_each(node, |source, entry| {
                visitor(node, source, a.in_relationships.get(entry))
            });
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

#[derive(Debug)]
pub(crate) struct HugeBuilder {
    outgoing: CompressedAdjacencyBuilder,
    weights: Option<HugeArrayBuilder<f64>>,
    order: Vec<usize>,
}

impl HugeBuilder {
    pub(crate) fn new(store_weights: bool) -> Self {
        Self {
            outgoing: CompressedAdjacencyBuilder::default(),
            weights: store_weights.then(HugeArrayBuilder::new),
            order: Vec::new(),
        }
    }
}

impl AdjacencyBuilder for HugeBuilder {
    type Output = HugeGraph;

    const BACKEND: &'static str = "huge";
    const CAPACITY: u64 = HUGE_CAPACITY;

    fn push_node(&mut self, targets: &[NodeId], weights: &[f64]) -> Result<(), GraphError> {
        let total = self.outgoing.entries + targets.len() as u64;
        if total > HUGE_CAPACITY {
            return Err(GraphError::Capacity {
                backend: Self::BACKEND,
                what: "relationship",
                requested: total,
                capacity: HUGE_CAPACITY,
            });
        }

        // Sort a permutation so weights follow their targets.
        self.order.clear();
        self.order.extend(0..targets.len());
        self.order.sort_by_key(|&i| targets[i]);

        self.outgoing
            .push_sorted(self.order.iter().map(|&i| targets[i] as u64));
        if let Some(table) = self.weights.as_mut() {
            for &i in &self.order {
                table.push(weights[i]);
            }
        }
        Ok(())
    }

    fn finish(self, ids: IdMap, plan: WeightPlan) -> HugeGraph {
        let node_count = ids.node_count() as u64;
        let outgoing = self.outgoing.build();
        let relationship_count = outgoing.first.get(node_count);

        let mut in_first = HugeArray::<u64>::new(node_count + 1);
        for source in 0..node_count as NodeId {
            outgoing.for_each(source, |target, _| {
                in_first.get_and_add(target as u64 + 1, 1);
                true
            });
        }
        for node in 0..node_count {
            let running = in_first.get(node);
            in_first.get_and_add(node + 1, running);
        }

        // Scatter incoming entries; sources arrive in ascending order.
        let mut cursor = HugeArray::<u64>::new(node_count);
        for node in 0..node_count {
            cursor.set(node, in_first.get(node));
        }
        let mut in_sources = HugeArray::<u64>::new(relationship_count);
        let mut in_relationships = HugeArray::<u64>::new(relationship_count);
        for source in 0..node_count as NodeId {
            outgoing.for_each(source, |target, relationship| {
                let slot = cursor.get_and_add(target as u64, 1);
                in_sources.set(slot, source as u64);
                in_relationships.set(slot, relationship);
                true
            });
        }
        drop(cursor);

        let mut incoming = CompressedAdjacencyBuilder::default();
        for node in 0..node_count {
            let range = in_first.get(node)..in_first.get(node + 1);
            incoming.push_sorted(range.map(|entry| in_sources.get(entry)));
        }
        let incoming = incoming.build();

        let weights = match (plan, self.weights) {
            (WeightPlan::Table, Some(table)) => Weights::Table(table.build()),
            (WeightPlan::Uniform(weight), _) => Weights::Uniform(weight),
            (WeightPlan::Absent | WeightPlan::Table, _) => Weights::Absent,
        };

        HugeGraph {
            inner: Arc::new(HugeAdjacency {
                ids,
                outgoing,
                incoming,
                in_relationships,
                weights,
            }),
        }
    }
}
