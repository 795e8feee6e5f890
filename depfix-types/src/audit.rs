use crate::project::Lockfile;
use serde::{Deserialize, Serialize};

/// How a dependency is reachable from the project manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Declared explicitly in the manifest.
    Direct,
    /// Pulled in through one or more direct dependencies.
    Transitive,
    /// Declared directly *and* pulled in transitively.
    Both,
}

impl DependencyKind {
    /// True for dependencies that may need a parent bump instead of a
    /// direct re-pin.
    pub fn is_transitive(self) -> bool {
        matches!(self, DependencyKind::Transitive | DependencyKind::Both)
    }
}

/// Lightweight reference to a direct ancestor chosen as the remediation
/// target for a transitive vulnerability.
///
/// Deliberately not a `Dependency`: the remediation plan is a flat list of
/// ancestor names and pinned versions, so the output model cannot contain a
/// cycle no matter what the input graph looked like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub name: String,
    pub version: String,
}

/// A dependency as reported by an ecosystem's audit tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
    pub version: String,

    #[serde(default)]
    pub is_dev: bool,

    /// Nearest direct ancestors to bump. Populated only for
    /// transitive/both reports whose ecosystem cannot re-pin transitively.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<ParentRef>,
}

/// One advisory attached to an audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityDetail {
    /// Advisory id, e.g. "GHSA-xxxx" or "CVE-2026-1234".
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// One vulnerable dependency in one lockfile, as found by an audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub dependency: Dependency,

    /// First known fixed version; `None` means no fix is published yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,

    /// Why no fix will be attempted for this report, when that is the case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_skip_reason: Option<String>,

    #[serde(default)]
    pub details: Vec<VulnerabilityDetail>,

    pub lockfile: Lockfile,

    #[serde(default)]
    pub severity: Severity,
}

/// Advisory severity, ordered from least to most severe.
///
/// Used only for the "maximum severity seen" rollup; ties keep the first
/// value encountered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_ordinal() {
        assert!(Severity::Unknown < Severity::Low);
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn transitive_and_both_need_parent_resolution() {
        assert!(DependencyKind::Transitive.is_transitive());
        assert!(DependencyKind::Both.is_transitive());
        assert!(!DependencyKind::Direct.is_transitive());
    }
}
