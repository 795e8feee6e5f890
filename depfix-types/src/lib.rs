//! Shared DTOs (schemas-as-code) for the depfix workspace.
//!
//! # Design constraints
//! - `ProjectSummary` is serialized to disk once per run; be conservative
//!   with breaking changes there.
//! - Prefer adding optional fields over changing semantics.

pub mod audit;
pub mod identity;
pub mod platform;
pub mod project;
pub mod status;
pub mod summary;

pub use audit::{AuditReport, Dependency, DependencyKind, ParentRef, Severity, VulnerabilityDetail};
pub use identity::{Author, BotIdentity};
pub use platform::{MergeRequest, MergeRequestOperation};
pub use project::{Lockfile, Project};
pub use status::{AuditFixOutcome, RemediationStatus};
pub use summary::ProjectSummary;
