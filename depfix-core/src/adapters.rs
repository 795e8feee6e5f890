//! Default shell- and environment-backed port implementations.

use crate::ports::{CiContext, GitPlatformClient, GitWorkspace, HookRunner, NotificationSink};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use depfix_types::{
    AuditReport, Author, BotIdentity, Lockfile, MergeRequest, MergeRequestOperation, Project,
};
use std::process::Command;
use tracing::{debug, error, info, warn};

/// `GitWorkspace` over the `git` CLI, bound to one working tree.
#[derive(Debug, Clone)]
pub struct ShellGitWorkspace {
    root: Utf8PathBuf,
}

impl ShellGitWorkspace {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Exit status only; a non-zero exit is a negative answer, not an error.
    fn check(&self, args: &[&str]) -> anyhow::Result<bool> {
        let status = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        Ok(status.success())
    }
}

impl GitWorkspace for ShellGitWorkspace {
    fn branch_exists_local(&self, name: &str) -> anyhow::Result<bool> {
        self.check(&["rev-parse", "--verify", "--quiet", &format!("refs/heads/{name}")])
    }

    fn branch_exists_remote(&self, name: &str) -> anyhow::Result<bool> {
        let out = self.run(&["ls-remote", "--heads", "origin", name])?;
        Ok(!out.trim().is_empty())
    }

    fn create_branch(&self, name: &str, from_ref: &str) -> anyhow::Result<()> {
        self.run(&["branch", name, from_ref]).map(drop)
    }

    fn switch_branch(&self, name: &str) -> anyhow::Result<()> {
        self.run(&["checkout", name]).map(drop)
    }

    fn pull(&self, branch: &str) -> anyhow::Result<()> {
        self.run(&["pull", "--ff-only", "origin", branch]).map(drop)
    }

    fn reset_branch_to_ref(&self, branch: &str, reference: &str) -> anyhow::Result<()> {
        self.run(&["checkout", branch])?;
        self.run(&["reset", "--hard", reference]).map(drop)
    }

    fn discard_changes(&self, paths: Option<&[Utf8PathBuf]>) -> anyhow::Result<()> {
        match paths {
            Some(paths) if !paths.is_empty() => {
                let mut args = vec!["checkout", "--"];
                args.extend(paths.iter().map(|p| p.as_str()));
                self.run(&args).map(drop)
            }
            Some(_) => Ok(()),
            None => {
                self.run(&["checkout", "--", "."])?;
                self.run(&["clean", "-fd"]).map(drop)
            }
        }
    }

    fn is_dirty(&self) -> anyhow::Result<bool> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(!out.trim().is_empty())
    }

    fn is_ignored(&self, path: &Utf8Path) -> bool {
        self.check(&["check-ignore", "-q", path.as_str()])
            .unwrap_or(false)
    }

    fn commit_files(&self, files: &[Utf8PathBuf], message: &str) -> anyhow::Result<bool> {
        let mut args = vec!["add", "--"];
        args.extend(files.iter().map(|p| p.as_str()));
        self.run(&args)?;

        // An empty staged diff means the fix was a no-op; create no commit.
        if self.check(&["diff", "--cached", "--quiet"])? {
            return Ok(false);
        }
        self.run(&["commit", "-m", message])?;
        Ok(true)
    }

    fn push(&self, branch: &str) -> anyhow::Result<()> {
        // The branch is rebuilt from the default tip every run, so pushing
        // rewrites history; the lease keeps a racing manual push safe.
        self.run(&["push", "--force-with-lease", "origin", branch])
            .map(drop)
    }

    fn commit_authors_between(&self, base: &str, tip: &str) -> anyhow::Result<Vec<Author>> {
        let out = self.run(&["log", "--format=%an\x1f%ae", &format!("{base}..{tip}")])?;
        let mut authors = Vec::new();
        for line in out.lines() {
            if let Some((name, email)) = line.split_once('\x1f') {
                authors.push(Author {
                    name: name.to_string(),
                    email: email.to_string(),
                });
            }
        }
        Ok(authors)
    }

    fn configure_identity(&self, identity: &BotIdentity) -> anyhow::Result<()> {
        self.run(&["config", "user.name", &identity.name])?;
        self.run(&["config", "user.email", &identity.email])
            .map(drop)
    }
}

/// Clone `clone_url` into `dest` and return the bound working-tree root.
pub fn clone_project(clone_url: &str, dest: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    if let Some(parent) = dest.parent() {
        fs_err::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    let output = Command::new("git")
        .args(["clone", clone_url, dest.as_str()])
        .output()
        .context("spawn git clone")?;
    if !output.status.success() {
        bail!(
            "git clone {} failed: {}",
            clone_url,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    debug!(dest = dest.as_str(), "cloned {clone_url}");
    Ok(dest.to_path_buf())
}

/// Recursively find every file named `file_name` under the project root,
/// excluding `.git` and version-control-ignored paths. Shared by adapter
/// implementations of `find_lockfiles`.
pub fn discover_lockfiles(
    project: &Project,
    file_name: &str,
    workspace: &dyn GitWorkspace,
) -> anyhow::Result<Vec<Lockfile>> {
    let root = project
        .root()
        .context("project has no working tree bound")?;
    let mut found = Vec::new();
    walk(root, root, file_name, workspace, &mut found)?;
    found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(found)
}

fn walk(
    dir: &Utf8Path,
    root: &Utf8Path,
    file_name: &str,
    workspace: &dyn GitWorkspace,
    found: &mut Vec<Lockfile>,
) -> anyhow::Result<()> {
    for entry in fs_err::read_dir(dir.as_std_path()).with_context(|| format!("read {}", dir))? {
        let entry = entry?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| anyhow::anyhow!("non-utf8 path: {}", p.display()))?;
        let name = match path.file_name() {
            Some(name) => name,
            None => continue,
        };
        if name == ".git" || workspace.is_ignored(&path) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, root, file_name, workspace, found)?;
        } else if name == file_name {
            let relative = path
                .strip_prefix(root)
                .map(Utf8Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            found.push(Lockfile::new(path, relative));
        }
    }
    Ok(())
}

/// Runs hook command lines via the shell, appending the changed files.
#[derive(Debug, Clone, Default)]
pub struct ShellHookRunner;

impl HookRunner for ShellHookRunner {
    fn run(
        &self,
        hooks: &[String],
        changed_files: &[Utf8PathBuf],
        project_root: &Utf8Path,
    ) -> anyhow::Result<()> {
        for hook in hooks {
            let mut parts = hook.split_whitespace();
            let Some(program) = parts.next() else {
                continue;
            };
            let output = Command::new(program)
                .args(parts)
                .args(changed_files.iter().map(|p| p.as_str()))
                .current_dir(project_root)
                .output()
                .with_context(|| format!("spawn hook `{hook}`"))?;
            if !output.status.success() {
                bail!(
                    "hook `{}` failed: {}",
                    hook,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            debug!(hook = hook.as_str(), "hook passed");
        }
        Ok(())
    }
}

/// Notification sink writing structured tracing events. Always registered;
/// the fallback when no external alerting is configured.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn failure(
        &self,
        context: &str,
        details: &str,
        project: Option<&Project>,
        report: Option<&AuditReport>,
        logfile_url: Option<&str>,
    ) -> anyhow::Result<()> {
        error!(
            context,
            project = project.map(|p| p.name.as_str()).unwrap_or("-"),
            dependency = report.map(|r| r.dependency.name.as_str()).unwrap_or("-"),
            logfile_url = logfile_url.unwrap_or("-"),
            "{details}"
        );
        Ok(())
    }

    fn merge_request(
        &self,
        mr: &MergeRequest,
        commit_messages: &[String],
        remaining_vulns: &[AuditReport],
    ) -> anyhow::Result<()> {
        info!(
            project = mr.project_name.as_str(),
            url = mr.url.as_str(),
            fixes = commit_messages.len(),
            remaining = remaining_vulns.len(),
            "merge request {}",
            match mr.operation {
                MergeRequestOperation::Created => "created",
                MergeRequestOperation::Updated => "updated",
            }
        );
        Ok(())
    }

    fn project_skipped(
        &self,
        project: &Project,
        reason: &str,
        logfile_url: Option<&str>,
    ) -> anyhow::Result<()> {
        warn!(
            project = project.name.as_str(),
            logfile_url = logfile_url.unwrap_or("-"),
            "project skipped: {reason}"
        );
        Ok(())
    }
}

/// Platform client that performs no remote calls: reports what it would
/// have done and points at the platform's new-merge-request page. Useful
/// for first runs and local smoke tests.
#[derive(Debug, Clone, Default)]
pub struct DryRunPlatform;

impl GitPlatformClient for DryRunPlatform {
    fn open_merge_request_url(
        &self,
        _project: &Project,
        _branch: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn create_or_update_merge_request(
        &self,
        project: &Project,
        commit_messages: &[String],
        branch: &str,
        remaining_vulns: &[AuditReport],
        title: &str,
    ) -> anyhow::Result<MergeRequest> {
        info!(
            project = project.name.as_str(),
            branch,
            fixes = commit_messages.len(),
            remaining = remaining_vulns.len(),
            "dry-run: would create or update merge request \"{title}\""
        );
        Ok(MergeRequest {
            title: title.to_string(),
            url: format!("{}/-/merge_requests/new?branch={branch}", project.web_url),
            project_url: project.web_url.clone(),
            project_name: project.name.clone(),
            operation: MergeRequestOperation::Created,
        })
    }
}

/// Reads the run's log URL from the CI environment.
#[derive(Debug, Clone)]
pub struct EnvCiContext {
    var: String,
}

impl EnvCiContext {
    /// GitLab CI exposes the job log as `CI_JOB_URL`.
    pub const DEFAULT_VAR: &'static str = "CI_JOB_URL";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCiContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl CiContext for EnvCiContext {
    fn logfile_url(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|v| !v.is_empty())
    }
}
