//! Load contract: turn an external node/relationship source into a [`Graph`].
//!
//! The source enumerates nodes once to build the [`IdMap`], then enumerates
//! each node's relationships in mapped order. Relationships pointing at nodes
//! the source never declared are skipped.

use tracing::{debug, info, instrument};

use crate::config::{Backend, LoadConfig, WeightMode};
use crate::error::GraphError;
use crate::graph::dense::{DENSE_CAPACITY, DenseBuilder};
use crate::graph::huge::HugeBuilder;
use crate::graph::{AnyGraph, DenseGraph, Graph, HugeGraph, NodeId};
use crate::huge_array::HUGE_CAPACITY;
use crate::ids::IdMap;

/// External supplier of nodes and relationships.
pub trait GraphSource {
    /// Declared node count, checked against backend capacity before loading.
    fn node_count(&self) -> u64;

    /// Enumerate original node ids. The enumeration order fixes mapped ids.
    fn for_each_node(&self, visit: &mut dyn FnMut(u64));

    /// Enumerate outgoing relationships of `original` as
    /// `(target original id, optional weight)`.
    fn for_each_relationship(&self, original: u64, visit: &mut dyn FnMut(u64, Option<f64>));
}

/// How the finished graph should expose weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WeightPlan {
    Absent,
    Uniform(f64),
    Table,
}

/// Per-backend adjacency sink fed in mapped-id order.
pub(crate) trait AdjacencyBuilder {
    type Output: Graph;

    const BACKEND: &'static str;
    const CAPACITY: u64;

    fn push_node(&mut self, targets: &[NodeId], weights: &[f64]) -> Result<(), GraphError>;

    fn finish(self, ids: IdMap, plan: WeightPlan) -> Self::Output;
}

/// In-memory [`GraphSource`] over explicit nodes and edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeListSource {
    nodes: Vec<u64>,
    seen: std::collections::HashMap<u64, usize>,
    edges: Vec<Vec<(u64, Option<f64>)>>,
}

impl EdgeListSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node; repeated declarations are ignored.
    pub fn add_node(&mut self, original: u64) -> &mut Self {
        self.slot(original);
        self
    }

    /// Add an unweighted relationship, declaring both endpoints.
    pub fn add_edge(&mut self, source: u64, target: u64) -> &mut Self {
        self.push_edge(source, target, None)
    }

    /// Add a weighted relationship, declaring both endpoints.
    pub fn add_weighted_edge(&mut self, source: u64, target: u64, weight: f64) -> &mut Self {
        self.push_edge(source, target, Some(weight))
    }

    /// Add a relationship without declaring its target; the loader drops it
    /// unless the target is declared separately.
    pub fn add_dangling_edge(&mut self, source: u64, target: u64) -> &mut Self {
        let slot = self.slot(source);
        self.edges[slot].push((target, None));
        self
    }

    pub fn push_edge(&mut self, source: u64, target: u64, weight: Option<f64>) -> &mut Self {
        let slot = self.slot(source);
        self.slot(target);
        self.edges[slot].push((target, weight));
        self
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    fn slot(&mut self, original: u64) -> usize {
        if let Some(&slot) = self.seen.get(&original) {
            return slot;
        }
        let slot = self.nodes.len();
        self.nodes.push(original);
        self.edges.push(Vec::new());
        self.seen.insert(original, slot);
        slot
    }
}

impl GraphSource for EdgeListSource {
    fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    fn for_each_node(&self, visit: &mut dyn FnMut(u64)) {
        for &node in &self.nodes {
            visit(node);
        }
    }

    fn for_each_relationship(&self, original: u64, visit: &mut dyn FnMut(u64, Option<f64>)) {
        if let Some(&slot) = self.seen.get(&original) {
            for &(target, weight) in &self.edges[slot] {
                visit(target, weight);
            }
        }
    }
}

/// Factory selecting and filling a storage backend.
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    config: LoadConfig,
}

impl GraphLoader {
    #[must_use]
    pub const fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Load into the configured backend.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, capacity overflow, duplicate node ids,
    /// or a missing weight without a configured default.
    #[instrument(skip(self, source), fields(backend = %self.config.backend))]
    pub fn load(&self, source: &dyn GraphSource) -> Result<AnyGraph, GraphError> {
        match self.config.backend {
            Backend::Dense => self.load_dense(source).map(AnyGraph::from),
            Backend::Huge => self.load_huge(source).map(AnyGraph::from),
            Backend::Auto => {
                if source.node_count() > DENSE_CAPACITY {
                    debug!(
                        nodes = source.node_count(),
                        "node count exceeds dense capacity, using huge backend"
                    );
                    return self.load_huge(source).map(AnyGraph::from);
                }
                match self.load_dense(source) {
                    Err(GraphError::Capacity { .. }) => {
                        debug!("relationship count exceeds dense capacity, retrying with huge backend");
                        self.load_huge(source).map(AnyGraph::from)
                    }
                    other => other.map(AnyGraph::from),
                }
            }
        }
    }

    /// Load into the array-backed backend.
    ///
    /// # Errors
    ///
    /// See [`GraphLoader::load`].
    pub fn load_dense(&self, source: &dyn GraphSource) -> Result<DenseGraph, GraphError> {
        let declared = check_capacity::<DenseBuilder>(source)?;
        let builder = DenseBuilder::new(declared, self.stores_weights());
        self.fill(source, builder)
    }

    /// Load into the paged backend.
    ///
    /// # Errors
    ///
    /// See [`GraphLoader::load`].
    pub fn load_huge(&self, source: &dyn GraphSource) -> Result<HugeGraph, GraphError> {
        check_capacity::<HugeBuilder>(source)?;
        let builder = HugeBuilder::new(self.stores_weights());
        self.fill(source, builder)
    }

    fn stores_weights(&self) -> bool {
        self.config.weights == WeightMode::Property
    }

    fn fill<B: AdjacencyBuilder>(
        &self,
        source: &dyn GraphSource,
        mut builder: B,
    ) -> Result<B::Output, GraphError> {
        self.config.validate()?;

        let mut ids = IdMap::with_capacity(usize::try_from(source.node_count()).unwrap_or(0));
        let mut duplicate = None;
        source.for_each_node(&mut |original| {
            if duplicate.is_none() && ids.add(original).is_err() {
                duplicate = Some(original);
            }
        });
        if let Some(original) = duplicate {
            return Err(GraphError::DuplicateNode(original));
        }
        if ids.node_count() as u64 > B::CAPACITY {
            return Err(capacity::<B>("node", ids.node_count() as u64));
        }

        let weighted = self.stores_weights();
        let default_weight = self.config.default_weight;
        let mut targets: Vec<NodeId> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut explicit = false;
        let mut skipped = 0_u64;
        let mut missing = None;

        for node in 0..ids.node_count() {
            targets.clear();
            weights.clear();
            let original = ids.to_original_id(node);
            source.for_each_relationship(original, &mut |target, weight| {
                let Some(mapped) = ids.to_mapped_id(target) else {
                    skipped += 1;
                    return;
                };
                targets.push(mapped);
                if weighted {
                    match weight.or(default_weight) {
                        Some(w) => {
                            explicit |= weight.is_some();
                            weights.push(w);
                        }
                        None => {
                            missing.get_or_insert((original, target));
                            weights.push(0.0);
                        }
                    }
                }
            });
            if let Some((source_id, target_id)) = missing {
                return Err(GraphError::config(format!(
                    "relationship {source_id} -> {target_id} has no weight and no default_weight is configured"
                )));
            }
            builder.push_node(&targets, &weights)?;
        }

        if skipped > 0 {
            debug!(skipped, "dropped relationships to undeclared nodes");
        }

        let plan = match (weighted, explicit, default_weight) {
            (false, _, _) => WeightPlan::Absent,
            (true, false, Some(w)) => WeightPlan::Uniform(w),
            (true, _, _) => WeightPlan::Table,
        };
        let graph = builder.finish(ids, plan);
        info!(
            backend = B::BACKEND,
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            weighted = graph.has_relationship_weights(),
            "graph loaded"
        );
        Ok(graph)
    }
}

fn check_capacity<B: AdjacencyBuilder>(source: &dyn GraphSource) -> Result<usize, GraphError> {
    let declared = source.node_count();
    if declared > B::CAPACITY {
        return Err(capacity::<B>("node", declared));
    }
    usize::try_from(declared).map_err(|_| capacity::<B>("node", declared))
}

const fn capacity<B: AdjacencyBuilder>(what: &'static str, requested: u64) -> GraphError {
    GraphError::Capacity {
        backend: B::BACKEND,
        what,
        requested,
        capacity: B::CAPACITY,
    }
}

/// Capacity of the named backend, for diagnostics.
#[must_use]
pub const fn backend_capacity(backend: Backend) -> u64 {
    match backend {
        Backend::Dense => DENSE_CAPACITY,
        Backend::Huge | Backend::Auto => HUGE_CAPACITY,
    }
}
