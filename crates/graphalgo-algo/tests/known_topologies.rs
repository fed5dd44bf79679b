//! Known-topology regression tests.
//!
//! Each test uses a hand-built graph whose expected result is known
//! analytically, and runs against both storage backends.

use graphalgo_algo::{
    BetweennessCentrality, Louvain, ShortestPathDijkstra, StronglyConnectedComponents, Target,
    modularity,
};
use graphalgo_core::{Direction, EdgeListSource, Executor, Graph, GraphLoader, LoadConfig};

#[path = "fixtures.rs"]
mod fixtures;
use fixtures::*;

// ---------------------------------------------------------------------------
// Strongly connected components
// ---------------------------------------------------------------------------

#[test]
fn three_triangles_form_three_components() {
    for backend in BACKENDS {
        let f = three_triangles(backend);
        let c = StronglyConnectedComponents::builder(&f.graph)
            .build()
            .compute()
            .unwrap()
            .into_value();

        assert_eq!(c.set_count(), 3, "{backend}");
        assert_eq!(c.min_set_size(), 3, "{backend}");
        assert_eq!(c.max_set_size(), 3, "{backend}");

        let group = |names: [&str; 3]| {
            let ids: Vec<_> = names.iter().map(|n| c.component(f.id(n))).collect();
            assert!(ids.iter().all(|&id| id.is_some() && id == ids[0]), "{names:?}");
            ids[0]
        };
        let abc = group(["a", "b", "c"]);
        let def = group(["d", "e", "f"]);
        let ghi = group(["g", "h", "i"]);
        assert_ne!(abc, def);
        assert_ne!(abc, ghi);
        assert_ne!(def, ghi);
    }
}

// ---------------------------------------------------------------------------
// Dijkstra
// ---------------------------------------------------------------------------

#[test]
fn six_node_path_costs_twenty() {
    for backend in BACKENDS {
        let f = six_node_weighted(backend);
        let outcome = ShortestPathDijkstra::builder(&f.graph)
            .source(f.id("a"))
            .target(Target::Node(f.id("f")))
            .build()
            .unwrap()
            .compute()
            .unwrap();
        assert!(outcome.completed);

        let paths = outcome.value;
        let path = paths.path();
        assert!((path.total_cost() - 20.0).abs() < 1e-9, "{backend}");
        assert!((paths.total_cost() - 20.0).abs() < 1e-9, "{backend}");
        assert_eq!(f.names(path.nodes()), vec!["a", "c", "e", "d", "f"], "{backend}");
    }
}

#[test]
fn seven_node_path_costs_eleven() {
    for backend in BACKENDS {
        let f = seven_node_weighted(backend);
        let paths = ShortestPathDijkstra::builder(&f.graph)
            .source(f.id("n1"))
            .target(Target::Node(f.id("n7")))
            .build()
            .unwrap()
            .compute()
            .unwrap()
            .into_value();
        let path = paths.path();

        assert!((path.total_cost() - 11.0).abs() < 1e-9, "{backend}");
        assert_eq!(f.names(path.nodes()), vec!["n1", "n3", "n6", "n7"], "{backend}");
        assert_eq!(path.iter().count(), path.len());

        let distances: Vec<f64> = path.iter().map(|(_, d)| d).collect();
        assert_eq!(distances, vec![0.0, 2.0, 10.0, 11.0]);
    }
}

#[test]
fn all_targets_settles_every_reachable_node() {
    let f = six_node_weighted(BACKENDS[0]);
    let paths = ShortestPathDijkstra::builder(&f.graph)
        .source(f.id("a"))
        .build()
        .unwrap()
        .compute()
        .unwrap()
        .into_value();
    for (name, expected) in [("b", 4.0), ("c", 2.0), ("e", 5.0), ("d", 9.0), ("f", 20.0)] {
        assert!((paths.distance(f.id(name)) - expected).abs() < 1e-9, "{name}");
        assert!(paths.is_settled(f.id(name)));
    }
    assert_eq!(f.names(paths.path_to(f.id("d")).nodes()), vec!["a", "c", "e", "d"]);
}

// ---------------------------------------------------------------------------
// Betweenness
// ---------------------------------------------------------------------------

#[test]
fn chain_centrality_on_both_backends() {
    for backend in BACKENDS {
        let g = unweighted(4, &[(0, 1), (1, 2), (2, 3)], backend);
        let bc = BetweennessCentrality::builder(&g)
            .build()
            .compute()
            .unwrap()
            .into_value();
        assert_eq!(bc.as_slice(), &[0.0, 2.0, 2.0, 0.0], "{backend}");
    }
}

#[test]
fn both_direction_is_a_quarter_of_out_plus_in_on_symmetric_graphs() {
    // Undirected path 0 - 1 - 2 - 3 with a triangle 1 - 4 - 2, every edge
    // stored in both directions. `Both` walks each stored pair twice and
    // divides by 2, so it lands at half of the Outgoing score.
    let undirected = [(0, 1), (1, 2), (2, 3), (1, 4), (4, 2)];
    let edges: Vec<(u64, u64)> = undirected
        .iter()
        .flat_map(|&(a, b)| [(a, b), (b, a)])
        .collect();
    for backend in BACKENDS {
        let g = unweighted(5, &edges, backend);
        let run = |direction| {
            BetweennessCentrality::builder(&g)
                .direction(direction)
                .build()
                .compute()
                .unwrap()
                .into_value()
        };
        let out = run(Direction::Outgoing);
        let incoming = run(Direction::Incoming);
        let both = run(Direction::Both);
        for node in 0..g.node_count() {
            let expected = (out.get(node) + incoming.get(node)) / 4.0;
            assert!(
                (both.get(node) - expected).abs() < 1e-9,
                "{backend} node {node}: both {} out {} in {}",
                both.get(node),
                out.get(node),
                incoming.get(node)
            );
        }
        // Node 1 separates 0 from {2, 3, 4}.
        assert!(out.get(1) > out.get(4));
    }
}

#[test]
fn both_direction_on_mutual_path() {
    let g = unweighted(3, &[(0, 1), (1, 0), (1, 2), (2, 1)], BACKENDS[0]);
    let run = |direction| {
        BetweennessCentrality::builder(&g)
            .direction(direction)
            .build()
            .compute()
            .unwrap()
            .into_value()
    };
    assert_eq!(run(Direction::Outgoing).as_slice(), &[0.0, 2.0, 0.0]);
    assert_eq!(run(Direction::Incoming).as_slice(), &[0.0, 2.0, 0.0]);
    assert_eq!(run(Direction::Both).as_slice(), &[0.0, 1.0, 0.0]);
}

// ---------------------------------------------------------------------------
// Louvain
// ---------------------------------------------------------------------------

#[test]
fn clique_chain_yields_one_community_per_clique() {
    for backend in BACKENDS {
        let g = unweighted(13, &clique_chain(&[4, 5, 4]), backend);
        let c = Louvain::builder(&g)
            .build()
            .unwrap()
            .compute()
            .unwrap()
            .into_value();
        assert_eq!(c.community_count(), 3, "{backend}");
        assert!((0..4).all(|n| c.community(n) == c.community(0)));
        assert!((4..9).all(|n| c.community(n) == c.community(4)));
        assert!((9..13).all(|n| c.community(n) == c.community(9)));

        let recomputed = modularity(&g, c.as_slice(), false).unwrap();
        assert!((recomputed - c.modularity()).abs() < 1e-9);
        assert!(c.iterations() >= c.levels());
    }
}

#[test]
fn parallel_variant_matches_sequential_partition() {
    let g = unweighted(13, &clique_chain(&[4, 5, 4]), BACKENDS[0]);
    let executor = Executor::new(3).unwrap();
    let parallel = Louvain::builder(&g)
        .executor(&executor)
        .build()
        .unwrap()
        .compute()
        .unwrap()
        .into_value();
    let sequential = Louvain::builder(&g)
        .build()
        .unwrap()
        .compute()
        .unwrap()
        .into_value();
    assert_eq!(parallel.community_count(), sequential.community_count());
    assert!((parallel.modularity() - sequential.modularity()).abs() < 1e-9);
}

#[test]
fn weights_decide_the_partition() {
    // Square a - b - c - d - a with heavy a-b and c-d.
    for backend in BACKENDS {
        let f = named(
            &[
                ("a", "b", 10.0),
                ("b", "c", 1.0),
                ("c", "d", 10.0),
                ("d", "a", 1.0),
            ],
            backend,
        );
        let c = Louvain::builder(&f.graph)
            .weighted(true)
            .build()
            .unwrap()
            .compute()
            .unwrap()
            .into_value();
        assert_eq!(c.community_count(), 2, "{backend}");
        assert_eq!(c.community(f.id("a")), c.community(f.id("b")));
        assert_eq!(c.community(f.id("c")), c.community(f.id("d")));
        assert_ne!(c.community(f.id("a")), c.community(f.id("c")));
    }
}

#[test]
fn rerun_on_converged_quotient_is_stable() {
    let base = unweighted(13, &clique_chain(&[4, 5, 4]), BACKENDS[0]);
    let first = Louvain::builder(&base)
        .build()
        .unwrap()
        .compute()
        .unwrap()
        .into_value();

    // Collapse every community into one node, keeping each base relationship
    // as a unit-weight relationship between communities.
    let mut source = EdgeListSource::new();
    for community in 0..first.community_count() {
        source.add_node(community as u64);
    }
    for node in 0..base.node_count() {
        base.for_each_relationship(node, Direction::Outgoing, |_, target, _| {
            source.add_weighted_edge(
                first.community(node) as u64,
                first.community(target) as u64,
                1.0,
            );
            true
        });
    }
    let quotient = GraphLoader::new(LoadConfig::default().weighted(None))
        .load(&source)
        .unwrap();

    let second = Louvain::builder(&quotient)
        .weighted(true)
        .max_iterations(1)
        .build()
        .unwrap()
        .compute()
        .unwrap()
        .into_value();
    assert_eq!(second.community_count(), first.community_count());
    assert!((second.modularity() - first.modularity()).abs() < 1e-9);
}
