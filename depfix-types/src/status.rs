use crate::audit::{AuditReport, Severity};
use serde::{Deserialize, Serialize};

/// Terminal status of one project run.
///
/// Monotonic within a run: starts at `Clean` and is only ever moved further
/// from it via [`RemediationStatus::downgrade`], never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    #[default]
    Clean,
    MrPending,
    VulnsLeft,
    ManualChanges,
    Error,
}

impl RemediationStatus {
    /// Distance from `Clean`; higher means worse.
    fn rank(self) -> u8 {
        match self {
            RemediationStatus::Clean => 0,
            RemediationStatus::MrPending => 1,
            RemediationStatus::VulnsLeft => 2,
            RemediationStatus::ManualChanges => 3,
            RemediationStatus::Error => 4,
        }
    }

    /// Move to `to` only if it is worse than the current status.
    pub fn downgrade(&mut self, to: RemediationStatus) {
        if to.rank() > self.rank() {
            *self = to;
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RemediationStatus::Clean => "clean",
            RemediationStatus::MrPending => "mr_pending",
            RemediationStatus::VulnsLeft => "vulns_left",
            RemediationStatus::ManualChanges => "manual_changes",
            RemediationStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulated result of the audit-fix loop for one project.
#[derive(Debug, Clone, Default)]
pub struct AuditFixOutcome {
    /// Maximum severity seen across all reports, ties keeping the first.
    pub severity: Severity,

    /// Generated commit messages, newest first.
    pub commit_messages: Vec<String>,

    /// Vulnerabilities still present after fixes: re-audit results for
    /// lockfiles that got commits, original reports for those that did not.
    pub remaining_vulns: Vec<AuditReport>,

    pub status: RemediationStatus,
}
