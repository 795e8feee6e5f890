//! Property-based tests for the parent resolver.
//!
//! These tests verify that:
//! - Resolution terminates on arbitrary graphs, cyclic ones included
//! - Every resolved name is a direct dependency
//! - Resolution is deterministic for a given graph

use depfix_domain::{DependencyGraph, resolve_direct_parents};
use proptest::prelude::*;

/// Strategy for a small package universe, arbitrary edges over it, and an
/// arbitrary subset of manifest-declared (direct) packages.
fn arb_graph_parts() -> impl Strategy<Value = (Vec<String>, Vec<(usize, usize)>, Vec<usize>)> {
    let names = prop::collection::vec(
        prop::string::string_regex(r"[a-z][a-z0-9_-]{0,8}").unwrap(),
        2..10,
    )
    .prop_map(|mut names| {
        names.sort();
        names.dedup();
        names
    })
    .prop_filter("need at least two packages", |names| names.len() >= 2);

    names.prop_flat_map(|names| {
        let n = names.len();
        let edges = prop::collection::vec((0..n, 0..n), 0..30);
        let direct = prop::collection::vec(0..n, 0..n);
        (Just(names), edges, direct)
    })
}

fn build_graph(
    names: &[String],
    edges: &[(usize, usize)],
    direct: &[usize],
) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (from, to) in edges {
        graph.add_edge(&names[*from], &names[*to]);
    }
    for idx in direct {
        graph.add_direct(&names[*idx], "1.0.0");
    }
    graph
}

proptest! {
    /// Resolution terminates and only ever names direct dependencies,
    /// even on graphs with self-loops and cycles.
    #[test]
    fn resolved_names_are_direct((names, edges, direct) in arb_graph_parts()) {
        let graph = build_graph(&names, &edges, &direct);
        for target in &names {
            for parent in resolve_direct_parents(&graph, target) {
                prop_assert!(graph.is_direct(&parent));
            }
        }
    }

    /// The same graph and target always resolve to the same collection.
    #[test]
    fn resolution_is_deterministic((names, edges, direct) in arb_graph_parts()) {
        let graph = build_graph(&names, &edges, &direct);
        for target in &names {
            let first = resolve_direct_parents(&graph, target);
            let second = resolve_direct_parents(&graph, target);
            prop_assert_eq!(first, second);
        }
    }

    /// With no direct dependencies at all, nothing can ever be resolved.
    #[test]
    fn no_direct_dependencies_means_no_parents((names, edges, _direct) in arb_graph_parts()) {
        let graph = build_graph(&names, &edges, &[]);
        for target in &names {
            prop_assert!(resolve_direct_parents(&graph, target).is_empty());
        }
    }
}
