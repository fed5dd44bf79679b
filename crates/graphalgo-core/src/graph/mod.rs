//! The graph capability interface and its storage backends.
//!
//! # Overview
//!
//! Every algorithm is written against the [`Graph`] trait: node count, id
//! mapping, per-direction degree, visitor-driven relationship iteration,
//! weight lookup, and [`Graph::concurrent_copy`]. Two backends implement it:
//!
//! - [`DenseGraph`]: flat `u32` compressed-sparse-row arrays. Fastest, but
//!   bounded by a single array index space.
//! - [`HugeGraph`]: the same contract over paged arrays with delta/varint
//!   encoded adjacency, for graphs past the dense limits.
//!
//! [`AnyGraph`] is what the loader factory hands back when the backend is
//! chosen at load time.
//!
//! # Visitor contract
//!
//! `for_each_relationship(node, direction, visitor)` calls
//! `visitor(node, neighbor, relationship_id)` for every matching
//! relationship. Returning `false` ends the iteration immediately: no further
//! relationship of that node is visited, including the incoming half of a
//! `Both` traversal.

pub mod dense;
pub mod huge;

use crate::direction::Direction;
use crate::huge_array::HugeArray;
use crate::ids::IdMap;

pub use dense::DenseGraph;
pub use huge::HugeGraph;

/// Dense mapped node id in `[0, node_count)`.
pub type NodeId = usize;

/// Identifier of a stored relationship; indexes the weight table.
pub type RelationshipId = u64;

/// Sentinel cost meaning "effectively unreachable".
pub const UNREACHABLE: f64 = f64::MAX;

/// Weight reported by graphs loaded without weights.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Read-only graph snapshot shared by all algorithms.
///
/// Implementations are immutable after load and safe to share across
/// threads. Traversal state lives in the caller's stack frame or in a
/// [`Graph::concurrent_copy`], never in shared fields.
pub trait Graph: Send + Sync {
    /// Short backend name for logs and errors.
    fn backend(&self) -> &'static str;

    fn node_count(&self) -> usize;

    fn relationship_count(&self) -> u64;

    fn id_map(&self) -> &IdMap;

    fn to_mapped_id(&self, original: u64) -> Option<NodeId> {
        self.id_map().to_mapped_id(original)
    }

    fn to_original_id(&self, node: NodeId) -> u64 {
        self.id_map().to_original_id(node)
    }

    /// Number of relationships `for_each_relationship` would visit.
    fn degree(&self, node: NodeId, direction: Direction) -> usize;

    /// Visit the relationships of `node`; see the module docs for the
    /// short-circuit contract.
    fn for_each_relationship<F>(&self, node: NodeId, direction: Direction, visitor: F)
    where
        F: FnMut(NodeId, NodeId, RelationshipId) -> bool;

    /// Whether real (or configured default) weights were loaded.
    fn has_relationship_weights(&self) -> bool;

    /// Weight of a relationship, [`DEFAULT_WEIGHT`] without a weight table.
    fn relationship_weight(&self, relationship: RelationshipId) -> f64;

    /// Weight of the first `source -> target` relationship, if any.
    fn relationship_weight_between(&self, source: NodeId, target: NodeId) -> Option<f64> {
        let mut found = None;
        self.for_each_relationship(source, Direction::Outgoing, |_, neighbor, relationship| {
            if neighbor == target {
                found = Some(self.relationship_weight(relationship));
                return false;
            }
            true
        });
        found
    }

    /// Independent handle over the same immutable data with private
    /// traversal state, for use by one worker thread.
    #[must_use]
    fn concurrent_copy(&self) -> Self
    where
        Self: Sized;
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Element store behind a weight table.
pub trait WeightStore: std::fmt::Debug + Send + Sync {
    fn weight(&self, relationship: RelationshipId) -> f64;
}

impl WeightStore for Vec<f64> {
    #[inline]
    fn weight(&self, relationship: RelationshipId) -> f64 {
        self[relationship as usize]
    }
}

impl WeightStore for HugeArray<f64> {
    #[inline]
    fn weight(&self, relationship: RelationshipId) -> f64 {
        self.get(relationship)
    }
}

/// Relationship weights as loaded.
#[derive(Debug, Clone)]
pub enum Weights<S> {
    /// Loaded without weights; lookups return [`DEFAULT_WEIGHT`].
    Absent,
    /// Weighted load where no relationship carried its own value: every
    /// relationship has the configured default and no table is kept.
    Uniform(f64),
    /// One entry per relationship id.
    Table(S),
}

impl<S: WeightStore> Weights<S> {
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, relationship: RelationshipId) -> f64 {
        match self {
            Self::Absent => DEFAULT_WEIGHT,
            Self::Uniform(weight) => *weight,
            Self::Table(store) => store.weight(relationship),
        }
    }
}

// ---------------------------------------------------------------------------
// AnyGraph
// ---------------------------------------------------------------------------

/// A graph whose backend was picked at load time.
#[derive(Debug, Clone)]
pub enum AnyGraph {
    Dense(DenseGraph),
    Huge(HugeGraph),
}

impl Graph for AnyGraph {
    fn backend(&self) -> &'static str {
        match self {
            Self::Dense(g) => g.backend(),
            Self::Huge(g) => g.backend(),
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Self::Dense(g) => g.node_count(),
            Self::Huge(g) => g.node_count(),
        }
    }

    fn relationship_count(&self) -> u64 {
        match self {
            Self::Dense(g) => g.relationship_count(),
            Self::Huge(g) => g.relationship_count(),
        }
    }

    fn id_map(&self) -> &IdMap {
        match self {
            Self::Dense(g) => g.id_map(),
            Self::Huge(g) => g.id_map(),
        }
    }

    fn degree(&self, node: NodeId, direction: Direction) -> usize {
        match self {
            Self::Dense(g) => g.degree(node, direction),
            Self::Huge(g) => g.degree(node, direction),
        }
    }

    fn for_each_relationship<F>(&self, node: NodeId, direction: Direction, visitor: F)
    where
        F: FnMut(NodeId, NodeId, RelationshipId) -> bool,
    {
        match self {
            Self::Dense(g) => g.for_each_relationship(node, direction, visitor),
            Self::Huge(g) => g.for_each_relationship(node, direction, visitor),
        }
    }

    fn has_relationship_weights(&self) -> bool {
        match self {
            Self::Dense(g) => g.has_relationship_weights(),
            Self::Huge(g) => g.has_relationship_weights(),
        }
    }

    fn relationship_weight(&self, relationship: RelationshipId) -> f64 {
        match self {
            Self::Dense(g) => g.relationship_weight(relationship),
            Self::Huge(g) => g.relationship_weight(relationship),
        }
    }

    fn concurrent_copy(&self) -> Self {
        match self {
            Self::Dense(g) => Self::Dense(g.concurrent_copy()),
            Self::Huge(g) => Self::Huge(g.concurrent_copy()),
        }
    }
}

impl From<DenseGraph> for AnyGraph {
    fn from(graph: DenseGraph) -> Self {
        Self::Dense(graph)
    }
}

impl From<HugeGraph> for AnyGraph {
    fn from(graph: HugeGraph) -> Self {
        Self::Huge(graph)
    }
}
