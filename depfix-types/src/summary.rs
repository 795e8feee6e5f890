use crate::audit::Severity;
use crate::status::RemediationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one durable artifact a project run leaves behind.
///
/// Summaries are collected across a batch and written as a single JSON
/// array, later aggregated by a separate reporting step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_name: String,

    /// When the summary was emitted (RFC 3339 on the wire).
    pub time_stamp: DateTime<Utc>,

    pub project_url: String,
    pub status_report: RemediationStatus,
    pub severity_score: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logfile_url: Option<String>,
}
