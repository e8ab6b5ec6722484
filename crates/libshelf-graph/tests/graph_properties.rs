//! Property tests for the graph algorithms on random acyclic graphs.
//!
//! Edges always point from a lower to a higher node index, so every
//! generated graph is a DAG.

use std::collections::BTreeSet;

use libshelf_graph::graph::{DepGraph, contract, find_all_cycles, prune, sort};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn node_name(i: usize) -> String {
    format!("lib{i:02}.so")
}

fn arb_dag() -> impl Strategy<Value = DepGraph> {
    (1usize..14).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n), 0..40).prop_map(move |pairs| {
            let mut graph = DepGraph::new();
            for i in 0..n {
                graph.ensure_node(&node_name(i));
            }
            for (a, b) in pairs {
                if a < b {
                    graph.add_dependency(&node_name(a), &node_name(b));
                }
            }
            graph
        })
    })
}

fn reachability(graph: &DepGraph) -> Vec<(String, BTreeSet<String>)> {
    graph
        .keys()
        .map(|id| (id.to_string(), graph.reachable_from(id)))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn sort_places_dependents_first(graph in arb_dag()) {
        let order = sort(&graph);
        prop_assert_eq!(order.len(), graph.node_count());

        let position = |id: &str| order.iter().position(|o| o == id);
        for (src, tgt) in graph.edges() {
            prop_assert!(position(src) < position(tgt), "{} must precede {}", src, tgt);
        }
    }

    #[test]
    fn prune_preserves_reachability(graph in arb_dag()) {
        let pruned = prune(&graph).expect("generated graphs are acyclic");
        prop_assert_eq!(reachability(&pruned), reachability(&graph));
        prop_assert!(pruned.edge_count() <= graph.edge_count());
        for (src, tgt) in pruned.edges() {
            prop_assert!(graph.successors(src).any(|s| s == tgt));
        }
    }

    #[test]
    fn prune_is_idempotent(graph in arb_dag()) {
        let once = prune(&graph).expect("acyclic");
        let twice = prune(&once).expect("acyclic");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn pruned_edges_have_no_alternative_path(graph in arb_dag()) {
        let pruned = prune(&graph).expect("acyclic");
        for (src, tgt) in pruned.edges() {
            let mut without = pruned.clone();
            without.remove_dependency(src, tgt).expect("edge exists");
            prop_assert!(!without.reachable_from(src).contains(tgt));
        }
    }

    #[test]
    fn contraction_keeps_edges_consistent(
        graph in arb_dag(),
        picks in prop::collection::btree_set(0usize..14, 1..5),
    ) {
        let members: Vec<String> = picks.iter().map(|&i| node_name(i)).collect();
        let mut contracted = graph.clone();
        let merged = contract(&mut contracted, "group", &members);

        let present = members.iter().filter(|m| graph.contains(m)).count();
        prop_assert_eq!(merged, present);
        for member in &members {
            prop_assert!(!contracted.contains(member));
        }
        for (src, tgt) in contracted.edges() {
            prop_assert_ne!(src, tgt);
            prop_assert!(contracted.predecessors(tgt).any(|p| p == src));
        }
        if present == 0 {
            prop_assert_eq!(&contracted, &graph);
        }
    }

    #[test]
    fn generated_graphs_have_no_cycles(graph in arb_dag()) {
        prop_assert!(find_all_cycles(&graph).is_empty());
    }
}
