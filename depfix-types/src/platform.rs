use serde::{Deserialize, Serialize};

/// Whether a merge-request upsert created a new request or refreshed an
/// existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeRequestOperation {
    Created,
    Updated,
}

/// A merge/pull request on the hosting platform, as returned by the
/// platform client after create-or-update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub title: String,
    pub url: String,
    pub project_url: String,
    pub project_name: String,
    pub operation: MergeRequestOperation,
}
