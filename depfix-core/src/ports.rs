//! Port traits abstracting all I/O away from the pipeline.

use camino::{Utf8Path, Utf8PathBuf};
use depfix_domain::DependencyGraph;
use depfix_types::{AuditReport, Author, BotIdentity, Lockfile, MergeRequest, Project};

/// Per-ecosystem plugin driving the package manager's own tooling.
pub trait PackageManagerAdapter {
    /// Discriminator used in configuration, e.g. "pip" or "yarn".
    fn name(&self) -> &str;

    /// Lockfile filename this ecosystem pins versions in.
    fn lockfile_name(&self) -> &str;

    /// Manifest filename direct dependencies are declared in.
    fn manifest_name(&self) -> &str;

    /// Find all lockfiles in the project working tree, recursively,
    /// excluding version-control-ignored paths.
    fn find_lockfiles(
        &self,
        project: &Project,
        workspace: &dyn GitWorkspace,
    ) -> anyhow::Result<Vec<Lockfile>>;

    fn install(&self, lockfile: &Lockfile) -> anyhow::Result<()>;

    /// Audit the lockfile. `re_audit` marks the post-fix scan computing the
    /// residual set.
    fn audit(&self, lockfile: &Lockfile, re_audit: bool) -> anyhow::Result<Vec<AuditReport>>;

    /// Apply the fix for one report. Returns the working-tree paths that
    /// changed; empty means there was nothing to do.
    fn update(&self, report: &AuditReport) -> anyhow::Result<Vec<Utf8PathBuf>>;

    /// True when the ecosystem's tooling can re-pin a transitive package at
    /// its resolved position; false routes transitive reports through
    /// parent resolution first.
    fn supports_transitive_pinning(&self) -> bool;

    /// Whole-project dependency graph for parent resolution. Only called
    /// when [`supports_transitive_pinning`](Self::supports_transitive_pinning)
    /// is false and a transitive report exists.
    fn dependency_graph(&self, lockfile: &Lockfile) -> anyhow::Result<DependencyGraph>;
}

/// Branch/commit/push primitives over one checked-out working tree.
pub trait GitWorkspace {
    fn branch_exists_local(&self, name: &str) -> anyhow::Result<bool>;
    fn branch_exists_remote(&self, name: &str) -> anyhow::Result<bool>;
    fn create_branch(&self, name: &str, from_ref: &str) -> anyhow::Result<()>;
    fn switch_branch(&self, name: &str) -> anyhow::Result<()>;
    fn pull(&self, branch: &str) -> anyhow::Result<()>;

    /// Hard-reset `branch` to `reference`, discarding the branch's own
    /// history.
    fn reset_branch_to_ref(&self, branch: &str, reference: &str) -> anyhow::Result<()>;

    /// Throw away uncommitted changes; `None` discards everything.
    fn discard_changes(&self, paths: Option<&[Utf8PathBuf]>) -> anyhow::Result<()>;

    fn is_dirty(&self) -> anyhow::Result<bool>;
    fn is_ignored(&self, path: &Utf8Path) -> bool;

    /// Stage and commit the given files. Returns false when the staged diff
    /// was empty and no commit was created.
    fn commit_files(&self, files: &[Utf8PathBuf], message: &str) -> anyhow::Result<bool>;

    fn push(&self, branch: &str) -> anyhow::Result<()>;

    /// Authors of the commits in `base..tip`.
    fn commit_authors_between(&self, base: &str, tip: &str) -> anyhow::Result<Vec<Author>>;

    fn configure_identity(&self, identity: &BotIdentity) -> anyhow::Result<()>;
}

/// Merge-request operations on the hosting platform.
pub trait GitPlatformClient {
    /// URL of the currently open merge request for `branch`, if any.
    fn open_merge_request_url(
        &self,
        project: &Project,
        branch: &str,
    ) -> anyhow::Result<Option<String>>;

    fn create_or_update_merge_request(
        &self,
        project: &Project,
        commit_messages: &[String],
        branch: &str,
        remaining_vulns: &[AuditReport],
        title: &str,
    ) -> anyhow::Result<MergeRequest>;
}

/// Alerting channel. Implementations own their formatting.
pub trait NotificationSink {
    fn failure(
        &self,
        context: &str,
        details: &str,
        project: Option<&Project>,
        report: Option<&AuditReport>,
        logfile_url: Option<&str>,
    ) -> anyhow::Result<()>;

    fn merge_request(
        &self,
        mr: &MergeRequest,
        commit_messages: &[String],
        remaining_vulns: &[AuditReport],
    ) -> anyhow::Result<()>;

    fn project_skipped(
        &self,
        project: &Project,
        reason: &str,
        logfile_url: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Hosting CI environment queries.
pub trait CiContext {
    /// URL of the log for the current run, when the CI exposes one.
    fn logfile_url(&self) -> Option<String>;
}

/// Runs configured pre-commit hook command lines against changed files.
pub trait HookRunner {
    fn run(
        &self,
        hooks: &[String],
        changed_files: &[Utf8PathBuf],
        project_root: &Utf8Path,
    ) -> anyhow::Result<()>;
}
