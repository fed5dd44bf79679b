//! Dense node id remapping.
//!
//! External systems hand us sparse 64-bit ids. Everything inside the engine
//! works on mapped ids in `[0, node_count)` so per-node state can live in
//! plain arrays. The mapping is assigned in enumeration order and never
//! changes for the lifetime of a loaded graph.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::GraphError;
use crate::graph::NodeId;

/// Bijective original id <-> mapped id table.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    originals: Vec<u64>,
    mapped: HashMap<u64, NodeId>,
}

impl IdMap {
    #[must_use]
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            originals: Vec::with_capacity(node_count),
            mapped: HashMap::with_capacity(node_count),
        }
    }

    /// Assign the next mapped id to `original`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if `original` was already added.
    pub fn add(&mut self, original: u64) -> Result<NodeId, GraphError> {
        let next = self.originals.len();
        match self.mapped.entry(original) {
            Entry::Occupied(_) => Err(GraphError::DuplicateNode(original)),
            Entry::Vacant(slot) => {
                slot.insert(next);
                self.originals.push(original);
                Ok(next)
            }
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.originals.len()
    }

    #[must_use]
    pub fn to_mapped_id(&self, original: u64) -> Option<NodeId> {
        self.mapped.get(&original).copied()
    }

    /// Original id of a mapped node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not below [`IdMap::node_count`].
    #[must_use]
    pub fn to_original_id(&self, node: NodeId) -> u64 {
        self.originals[node]
    }

    /// Checked variant of [`IdMap::to_original_id`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] for an out-of-range mapped id.
    pub fn try_to_original_id(&self, node: NodeId) -> Result<u64, GraphError> {
        self.originals
            .get(node)
            .copied()
            .ok_or(GraphError::UnknownNode {
                node,
                node_count: self.originals.len(),
            })
    }

    /// Original ids in mapped order.
    #[must_use]
    pub fn originals(&self) -> &[u64] {
        &self.originals
    }
}

#[cfg(test)]
mod tests {
    use super::IdMap;
    use crate::error::GraphError;

    #[test]
    fn assigns_dense_ids_in_insertion_order() {
        let mut ids = IdMap::default();
        assert_eq!(ids.add(900).ok(), Some(0));
        assert_eq!(ids.add(17).ok(), Some(1));
        assert_eq!(ids.add(4_000_000_000_000).ok(), Some(2));

        assert_eq!(ids.node_count(), 3);
        assert_eq!(ids.to_mapped_id(17), Some(1));
        assert_eq!(ids.to_original_id(2), 4_000_000_000_000);
        assert_eq!(ids.to_mapped_id(5), None);
    }

    #[test]
    fn rejects_duplicate_original() {
        let mut ids = IdMap::default();
        ids.add(1).unwrap();
        assert!(matches!(ids.add(1), Err(GraphError::DuplicateNode(1))));
        assert_eq!(ids.node_count(), 1);
    }

    #[test]
    fn checked_lookup_reports_range() {
        let mut ids = IdMap::default();
        ids.add(8).unwrap();
        assert_eq!(ids.try_to_original_id(0).ok(), Some(8));
        assert!(matches!(
            ids.try_to_original_id(3),
            Err(GraphError::UnknownNode { node: 3, node_count: 1 })
        ));
    }
}
