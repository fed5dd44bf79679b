#![allow(dead_code)]

use graphalgo_core::EdgeListSource;
use proptest::prelude::*;

/// Random directed multigraph: node count plus `(source, target, weight)`
/// triples over original ids `node * 7 + 3`, so originals are sparse.
#[derive(Debug, Clone)]
pub struct RandomGraph {
    pub nodes: usize,
    pub edges: Vec<(usize, usize, f64)>,
}

impl RandomGraph {
    pub fn original(node: usize) -> u64 {
        node as u64 * 7 + 3
    }

    pub fn source(&self) -> EdgeListSource {
        let mut source = EdgeListSource::new();
        for node in 0..self.nodes {
            source.add_node(Self::original(node));
        }
        for &(s, t, w) in &self.edges {
            source.add_weighted_edge(Self::original(s), Self::original(t), w);
        }
        source
    }

    pub fn has_self_loop(&self) -> bool {
        self.edges.iter().any(|&(s, t, _)| s == t)
    }
}

pub fn arb_graph(max_nodes: usize, max_edges: usize) -> impl Strategy<Value = RandomGraph> {
    (1..=max_nodes).prop_flat_map(move |nodes| {
        prop::collection::vec((0..nodes, 0..nodes, 0.5_f64..20.0), 0..=max_edges)
            .prop_map(move |edges| RandomGraph { nodes, edges })
    })
}

/// Same as [`arb_graph`] without self-loops.
pub fn arb_loopless_graph(max_nodes: usize, max_edges: usize) -> impl Strategy<Value = RandomGraph> {
    arb_graph(max_nodes, max_edges).prop_map(|mut g| {
        g.edges.retain(|&(s, t, _)| s != t);
        g
    })
}
