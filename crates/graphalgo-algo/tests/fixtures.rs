#![allow(dead_code)]

use std::collections::HashMap;

use graphalgo_core::{AnyGraph, Backend, EdgeListSource, Graph, GraphLoader, LoadConfig, NodeId};

/// A loaded graph with its nodes addressable by name.
pub struct Named {
    pub graph: AnyGraph,
    originals: HashMap<String, u64>,
}

impl Named {
    pub fn id(&self, name: &str) -> NodeId {
        self.graph
            .to_mapped_id(self.originals[name])
            .unwrap_or_else(|| panic!("{name} not loaded"))
    }

    pub fn names(&self, nodes: &[NodeId]) -> Vec<String> {
        let by_original: HashMap<u64, &str> = self
            .originals
            .iter()
            .map(|(name, &original)| (original, name.as_str()))
            .collect();
        nodes
            .iter()
            .map(|&n| by_original[&self.graph.to_original_id(n)].to_string())
            .collect()
    }
}

pub const BACKENDS: [Backend; 2] = [Backend::Dense, Backend::Huge];

/// Load named weighted edges. Originals are spaced out so they never
/// coincide with mapped ids.
pub fn named(edges: &[(&str, &str, f64)], backend: Backend) -> Named {
    let mut originals: HashMap<String, u64> = HashMap::new();
    let mut source = EdgeListSource::new();
    let mut original = |name: &str| {
        let next = 1_000 + originals.len() as u64 * 31;
        *originals.entry(name.to_string()).or_insert(next)
    };
    for &(s, t, w) in edges {
        let (s, t) = (original(s), original(t));
        source.add_weighted_edge(s, t, w);
    }
    let graph = GraphLoader::new(
        LoadConfig::default()
            .with_backend(backend)
            .weighted(Some(f64::MAX)),
    )
    .load(&source)
    .unwrap();
    Named { graph, originals }
}

/// Unweighted graph over integer originals.
pub fn unweighted(nodes: u64, edges: &[(u64, u64)], backend: Backend) -> AnyGraph {
    let mut source = EdgeListSource::new();
    for node in 0..nodes {
        source.add_node(node);
    }
    for &(s, t) in edges {
        source.add_edge(s, t);
    }
    GraphLoader::new(LoadConfig::default().with_backend(backend))
        .load(&source)
        .unwrap()
}

/// a -> b -> c -> a, d -> e -> f -> d, g -> h -> i -> g, plus a -> d.
pub fn three_triangles(backend: Backend) -> Named {
    named(
        &[
            ("a", "b", 1.0),
            ("b", "c", 1.0),
            ("c", "a", 1.0),
            ("d", "e", 1.0),
            ("e", "f", 1.0),
            ("f", "d", 1.0),
            ("g", "h", 1.0),
            ("h", "i", 1.0),
            ("i", "g", 1.0),
            ("a", "d", 1.0),
        ],
        backend,
    )
}

pub fn six_node_weighted(backend: Backend) -> Named {
    named(
        &[
            ("a", "b", 4.0),
            ("a", "c", 2.0),
            ("b", "c", 5.0),
            ("b", "d", 10.0),
            ("c", "e", 3.0),
            ("d", "f", 11.0),
            ("e", "d", 4.0),
        ],
        backend,
    )
}

pub fn seven_node_weighted(backend: Backend) -> Named {
    named(
        &[
            ("n1", "n2", 6.0),
            ("n1", "n3", 2.0),
            ("n1", "n4", 16.0),
            ("n2", "n5", 4.0),
            ("n2", "n4", 5.0),
            ("n3", "n2", 7.0),
            ("n3", "n5", 3.0),
            ("n3", "n6", 8.0),
            ("n4", "n3", 7.0),
            ("n5", "n4", 4.0),
            ("n5", "n7", 10.0),
            ("n6", "n7", 1.0),
        ],
        backend,
    )
}

/// Cliques of the given sizes, consecutive cliques joined by one bridge.
pub fn clique_chain(sizes: &[u64]) -> Vec<(u64, u64)> {
    let mut edges = Vec::new();
    let mut offset = 0;
    for (index, &size) in sizes.iter().enumerate() {
        for i in 0..size {
            for j in (i + 1)..size {
                edges.push((offset + i, offset + j));
            }
        }
        if index + 1 < sizes.len() {
            edges.push((offset + size - 1, offset + size));
        }
        offset += size;
    }
    edges
}
