use crate::graph::{DependencyGraph, resolve_direct_parents};
use depfix_types::{AuditReport, ParentRef};
use std::collections::BTreeSet;

/// Attach parent-bump targets to transitive reports.
///
/// For each transitive/both report, in order, the direct ancestors pulling
/// the vulnerable package in are resolved from `graph` and attached as
/// [`ParentRef`]s carrying the parents' currently pinned versions.
///
/// Deduplication: a report whose required parent set is a subset of a set
/// already scheduled for bumping gets no instruction, only a skip reason;
/// the broader scheduled bump is expected to resolve it transitively too.
pub fn attach_parent_bumps(reports: &mut [AuditReport], graph: &DependencyGraph) {
    let mut scheduled: Vec<BTreeSet<String>> = Vec::new();

    for report in reports.iter_mut() {
        if !report.dependency.kind.is_transitive() {
            continue;
        }

        let parents: BTreeSet<String> = resolve_direct_parents(graph, &report.dependency.name)
            .into_iter()
            .collect();
        if parents.is_empty() {
            continue;
        }

        if let Some(covering) = scheduled.iter().find(|set| parents.is_subset(set)) {
            let names = covering.iter().cloned().collect::<Vec<_>>().join(", ");
            report.fix_skip_reason =
                Some(format!("covered by already scheduled update of {names}"));
            continue;
        }

        report.dependency.parents = parents
            .iter()
            .map(|name| ParentRef {
                name: name.clone(),
                version: graph.direct_version(name).unwrap_or_default().to_string(),
            })
            .collect();
        scheduled.push(parents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depfix_types::{Dependency, DependencyKind, Lockfile, Severity};
    use pretty_assertions::assert_eq;

    fn report(name: &str, kind: DependencyKind) -> AuditReport {
        AuditReport {
            dependency: Dependency {
                name: name.to_string(),
                kind,
                version: "0.1.0".to_string(),
                is_dev: false,
                parents: vec![],
            },
            fixed_version: None,
            fix_skip_reason: None,
            details: vec![],
            lockfile: Lockfile::new("/p/lock".into(), "lock".into()),
            severity: Severity::Moderate,
        }
    }

    fn graph() -> DependencyGraph {
        // p1 -> a -> leaf_a ; p4 -> leaf_a ; p4 -> leaf_b
        let mut g = DependencyGraph::new();
        g.add_direct("p1", "1.2.0");
        g.add_direct("p4", "4.0.1");
        g.add_edge("p1", "a");
        g.add_edge("a", "leaf_a");
        g.add_edge("p4", "leaf_a");
        g.add_edge("p4", "leaf_b");
        g
    }

    fn parent_names(report: &AuditReport) -> Vec<&str> {
        report
            .dependency
            .parents
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    #[test]
    fn attaches_parents_with_pinned_versions() {
        let mut reports = vec![report("leaf_a", DependencyKind::Transitive)];
        attach_parent_bumps(&mut reports, &graph());

        assert_eq!(parent_names(&reports[0]), vec!["p1", "p4"]);
        assert_eq!(reports[0].dependency.parents[0].version, "1.2.0");
        assert_eq!(reports[0].dependency.parents[1].version, "4.0.1");
        assert!(reports[0].fix_skip_reason.is_none());
    }

    #[test]
    fn direct_reports_are_left_alone() {
        let mut reports = vec![report("p1", DependencyKind::Direct)];
        attach_parent_bumps(&mut reports, &graph());
        assert!(reports[0].dependency.parents.is_empty());
        assert!(reports[0].fix_skip_reason.is_none());
    }

    #[test]
    fn subset_of_scheduled_set_is_skipped_with_reason() {
        // leaf_a needs {p1, p4}; leaf_b needs {p4}, a subset of it.
        let mut reports = vec![
            report("leaf_a", DependencyKind::Transitive),
            report("leaf_b", DependencyKind::Transitive),
        ];
        attach_parent_bumps(&mut reports, &graph());

        assert_eq!(parent_names(&reports[0]), vec!["p1", "p4"]);
        assert!(reports[1].dependency.parents.is_empty());
        let reason = reports[1].fix_skip_reason.as_deref().unwrap();
        assert!(reason.contains("p1, p4"), "reason was: {reason}");
    }

    #[test]
    fn equal_sets_count_as_subsets() {
        let mut g = DependencyGraph::new();
        g.add_direct("p1", "1.0.0");
        g.add_edge("p1", "x");
        g.add_edge("p1", "y");
        let mut reports = vec![
            report("x", DependencyKind::Transitive),
            report("y", DependencyKind::Transitive),
        ];
        attach_parent_bumps(&mut reports, &g);

        assert_eq!(parent_names(&reports[0]), vec!["p1"]);
        assert!(reports[1].dependency.parents.is_empty());
        assert!(reports[1].fix_skip_reason.is_some());
    }

    #[test]
    fn superset_is_not_skipped() {
        // The narrower set comes first; the broader one must still be
        // scheduled (only subsets of already-scheduled sets are dropped).
        let mut reports = vec![
            report("leaf_b", DependencyKind::Transitive),
            report("leaf_a", DependencyKind::Transitive),
        ];
        attach_parent_bumps(&mut reports, &graph());

        assert_eq!(parent_names(&reports[0]), vec!["p4"]);
        assert_eq!(parent_names(&reports[1]), vec!["p1", "p4"]);
        assert!(reports[1].fix_skip_reason.is_none());
    }

    #[test]
    fn unresolvable_transitive_report_is_untouched() {
        let mut reports = vec![report("orphan", DependencyKind::Transitive)];
        attach_parent_bumps(&mut reports, &graph());
        assert!(reports[0].dependency.parents.is_empty());
        assert!(reports[0].fix_skip_reason.is_none());
    }

    #[test]
    fn both_kind_gets_parents_too() {
        let mut reports = vec![report("leaf_b", DependencyKind::Both)];
        attach_parent_bumps(&mut reports, &graph());
        assert_eq!(parent_names(&reports[0]), vec!["p4"]);
    }
}
