use graphalgo_core::{Backend, Direction, Graph, GraphLoader, LoadConfig, NodeId};
use proptest::prelude::*;

#[path = "generators.rs"]
mod generators;
use generators::*;

fn loader(backend: Backend) -> GraphLoader {
    GraphLoader::new(LoadConfig::default().with_backend(backend).weighted(None))
}

/// Sorted `(neighbor, weight)` pairs so backends with different list order
/// compare equal.
fn adjacency(graph: &impl Graph, node: NodeId, direction: Direction) -> Vec<(NodeId, u64)> {
    let mut out = Vec::new();
    graph.for_each_relationship(node, direction, |_, other, rel| {
        out.push((other, graph.relationship_weight(rel).to_bits()));
        true
    });
    out.sort_unstable();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn both_degree_is_out_plus_in(g in arb_loopless_graph(40, 160)) {
        let graph = loader(Backend::Dense).load(&g.source()).unwrap();
        for n in 0..graph.node_count() {
            prop_assert_eq!(
                graph.degree(n, Direction::Both),
                graph.degree(n, Direction::Outgoing) + graph.degree(n, Direction::Incoming)
            );
        }
    }

    #[test]
    fn dense_and_huge_expose_same_graph(g in arb_graph(40, 160)) {
        let source = g.source();
        let dense = loader(Backend::Dense).load_dense(&source).unwrap();
        let huge = loader(Backend::Huge).load_huge(&source).unwrap();

        prop_assert_eq!(dense.node_count(), huge.node_count());
        prop_assert_eq!(dense.relationship_count(), huge.relationship_count());
        for n in 0..dense.node_count() {
            prop_assert_eq!(dense.to_original_id(n), huge.to_original_id(n));
            for direction in [Direction::Outgoing, Direction::Incoming, Direction::Both] {
                prop_assert_eq!(dense.degree(n, direction), huge.degree(n, direction));
                prop_assert_eq!(adjacency(&dense, n, direction), adjacency(&huge, n, direction));
            }
        }
    }

    #[test]
    fn original_ids_round_trip(g in arb_graph(60, 10)) {
        let graph = loader(Backend::Huge).load(&g.source()).unwrap();
        for node in 0..g.nodes {
            let original = RandomGraph::original(node);
            let mapped = graph.to_mapped_id(original);
            prop_assert_eq!(mapped, Some(node));
            prop_assert_eq!(graph.to_original_id(node), original);
        }
    }
}
