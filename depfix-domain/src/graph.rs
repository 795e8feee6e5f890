use std::collections::{BTreeMap, BTreeSet};

/// Whole-project dependency graph as reported by an ecosystem's tooling.
///
/// `edges` maps every package to the packages it depends on. `direct` holds
/// the dependencies declared in the project manifest with their currently
/// pinned versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
    direct: BTreeMap<String, String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `package` depends on `dependency`.
    pub fn add_edge(&mut self, package: &str, dependency: &str) {
        self.edges
            .entry(package.to_string())
            .or_default()
            .push(dependency.to_string());
    }

    /// Record a manifest-declared dependency and its pinned version.
    pub fn add_direct(&mut self, name: &str, version: &str) {
        self.direct.insert(name.to_string(), version.to_string());
    }

    pub fn is_direct(&self, name: &str) -> bool {
        self.direct.contains_key(name)
    }

    /// Pinned version of a direct dependency.
    pub fn direct_version(&self, name: &str) -> Option<&str> {
        self.direct.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.direct.is_empty()
    }

    /// Reverse adjacency: child -> its parents.
    fn reverse(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut reverse: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (package, dependencies) in &self.edges {
            for dependency in dependencies {
                reverse
                    .entry(dependency.as_str())
                    .or_default()
                    .push(package.as_str());
            }
        }
        reverse
    }
}

/// Resolve the direct dependencies that transitively pull in `target`.
///
/// Walks the reverse graph upward from `target`. An immediate parent that is
/// itself a direct dependency is recorded as an uppermost parent; any other
/// parent is recursed into unless it was already visited, which also
/// terminates cyclic graphs. The returned collection may contain duplicates
/// when several paths reach the same direct dependency.
///
/// A target absent from the reverse graph yields an empty result. Calling
/// this for a dependency that is itself direct is not meaningful.
pub fn resolve_direct_parents(graph: &DependencyGraph, target: &str) -> Vec<String> {
    let reverse = graph.reverse();
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut found = Vec::new();
    visited.insert(target);
    walk_up(&reverse, graph, target, &mut visited, &mut found);
    found
}

fn walk_up<'g>(
    reverse: &BTreeMap<&'g str, Vec<&'g str>>,
    graph: &DependencyGraph,
    node: &str,
    visited: &mut BTreeSet<&'g str>,
    found: &mut Vec<String>,
) {
    let Some(parents) = reverse.get(node) else {
        return;
    };
    for parent in parents {
        if graph.is_direct(parent) {
            found.push((*parent).to_string());
        } else if visited.insert(*parent) {
            walk_up(reverse, graph, parent, visited, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn target_absent_from_reverse_graph_yields_nothing() {
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_edge("p1", "p2");
        assert!(resolve_direct_parents(&graph, "unrelated").is_empty());
    }

    #[test]
    fn immediate_direct_parent_is_recorded() {
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_edge("p1", "p2");
        assert_eq!(resolve_direct_parents(&graph, "p2"), vec!["p1".to_string()]);
    }

    #[test]
    fn multiple_direct_parents_are_all_found() {
        // P3 is pulled in by both P1 and P4, which are direct.
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_direct("p4", "4.2.0");
        graph.add_edge("p1", "p3");
        graph.add_edge("p4", "p3");
        assert_eq!(
            sorted(resolve_direct_parents(&graph, "p3")),
            vec!["p1".to_string(), "p4".to_string()]
        );
    }

    #[test]
    fn walks_through_intermediate_transitive_parents() {
        // p1 (direct) -> mid -> leaf
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_edge("p1", "mid");
        graph.add_edge("mid", "leaf");
        assert_eq!(
            resolve_direct_parents(&graph, "leaf"),
            vec!["p1".to_string()]
        );
    }

    #[test]
    fn cyclic_graph_terminates_with_empty_result() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "a");
        assert!(resolve_direct_parents(&graph, "a").is_empty());
    }

    #[test]
    fn cycle_above_target_still_finds_direct_roots() {
        // root (direct) -> a <-> b, and b -> leaf.
        let mut graph = DependencyGraph::new();
        graph.add_direct("root", "2.0.0");
        graph.add_edge("root", "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        graph.add_edge("b", "leaf");
        assert_eq!(
            resolve_direct_parents(&graph, "leaf"),
            vec!["root".to_string()]
        );
    }

    #[test]
    fn duplicate_paths_to_one_direct_parent_are_preserved() {
        // p1 -> a -> leaf and p1 -> b -> leaf: p1 is reported per path.
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_edge("p1", "a");
        graph.add_edge("p1", "b");
        graph.add_edge("a", "leaf");
        graph.add_edge("b", "leaf");
        assert_eq!(
            resolve_direct_parents(&graph, "leaf"),
            vec!["p1".to_string(), "p1".to_string()]
        );
    }

    #[test]
    fn results_only_ever_name_direct_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.add_direct("p1", "1.0.0");
        graph.add_edge("p1", "mid");
        graph.add_edge("mid", "deep");
        graph.add_edge("deep", "leaf");
        for name in resolve_direct_parents(&graph, "leaf") {
            assert!(graph.is_direct(&name));
        }
    }
}
