//! Pure remediation-planning logic, no I/O.
//!
//! Some ecosystem tools can only re-pin a version where it is *directly*
//! declared. When the vulnerable package is transitive, remediation has to
//! target the direct dependencies that pull it in. This crate resolves
//! those targets from the project dependency graph and decides which
//! reports actually get a parent-bump instruction.

mod graph;
mod plan;

pub use graph::{DependencyGraph, resolve_direct_parents};
pub use plan::attach_parent_bumps;
