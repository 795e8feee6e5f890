//! Scriptable fakes shared by the loop and pipeline tests.

use crate::ports::{
    CiContext, GitPlatformClient, GitWorkspace, HookRunner, NotificationSink,
    PackageManagerAdapter,
};
use camino::{Utf8Path, Utf8PathBuf};
use depfix_domain::DependencyGraph;
use depfix_types::{
    AuditReport, Author, BotIdentity, Dependency, DependencyKind, Lockfile, MergeRequest,
    MergeRequestOperation, Project, Severity, VulnerabilityDetail,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub fn make_project(name: &str) -> Project {
    Project {
        name: name.to_string(),
        path: Some(Utf8PathBuf::from(format!("/tmp/depfix-test/{name}"))),
        default_branch: "main".to_string(),
        clone_url: format!("https://git.example.com/{name}.git"),
        web_url: format!("https://git.example.com/{name}"),
    }
}

pub fn make_lockfile(relative: &str) -> Lockfile {
    Lockfile::new(
        Utf8PathBuf::from(format!("/tmp/depfix-test/p/{relative}")),
        Utf8PathBuf::from(relative),
    )
}

pub fn make_report(dep: &str, kind: DependencyKind, severity: Severity, lockfile: &str) -> AuditReport {
    AuditReport {
        dependency: Dependency {
            name: dep.to_string(),
            kind,
            version: "1.0.0".to_string(),
            is_dev: false,
            parents: vec![],
        },
        fixed_version: Some("1.0.1".to_string()),
        fix_skip_reason: None,
        details: vec![VulnerabilityDetail {
            id: format!("CVE-0000-{dep}"),
            description: String::new(),
            recommendations: vec![],
            aliases: vec![],
        }],
        lockfile: make_lockfile(lockfile),
        severity,
    }
}

/// Scriptable package-manager adapter recording every call.
#[derive(Default)]
pub struct FakeManager {
    pub name: String,
    pub lockfiles: Vec<Lockfile>,
    pub fail_find: bool,
    pub fail_install_for: Vec<String>,
    pub fail_audit_for: Vec<String>,
    pub fail_re_audit_for: Vec<String>,
    pub reports_by_lockfile: BTreeMap<String, Vec<AuditReport>>,
    pub re_audit_by_lockfile: BTreeMap<String, Vec<AuditReport>>,
    pub fail_update_for: Vec<String>,
    pub no_change_update_for: Vec<String>,
    pub transitive_pinning: bool,
    pub fail_graph: bool,
    pub graph: DependencyGraph,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl FakeManager {
    /// A manager that discovers nothing at all.
    pub fn quiet(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transitive_pinning: true,
            ..Self::default()
        }
    }

    pub fn with_lockfile(name: &str, relative: &str, reports: Vec<AuditReport>) -> Self {
        let mut manager = Self::quiet(name);
        manager.lockfiles = vec![make_lockfile(relative)];
        manager
            .reports_by_lockfile
            .insert(relative.to_string(), reports);
        manager
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl PackageManagerAdapter for FakeManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn lockfile_name(&self) -> &str {
        "fake.lock"
    }

    fn manifest_name(&self) -> &str {
        "fake.toml"
    }

    fn find_lockfiles(
        &self,
        _project: &Project,
        _workspace: &dyn GitWorkspace,
    ) -> anyhow::Result<Vec<Lockfile>> {
        self.record("find");
        if self.fail_find {
            anyhow::bail!("lockfile discovery exploded");
        }
        Ok(self.lockfiles.clone())
    }

    fn install(&self, lockfile: &Lockfile) -> anyhow::Result<()> {
        let rel = lockfile.relative_path.to_string();
        self.record(format!("install {rel}"));
        if self.fail_install_for.contains(&rel) {
            anyhow::bail!("install failed for {rel}");
        }
        Ok(())
    }

    fn audit(&self, lockfile: &Lockfile, re_audit: bool) -> anyhow::Result<Vec<AuditReport>> {
        let rel = lockfile.relative_path.to_string();
        if re_audit {
            self.record(format!("re-audit {rel}"));
            if self.fail_re_audit_for.contains(&rel) {
                anyhow::bail!("re-audit failed for {rel}");
            }
            Ok(self
                .re_audit_by_lockfile
                .get(&rel)
                .cloned()
                .unwrap_or_default())
        } else {
            self.record(format!("audit {rel}"));
            if self.fail_audit_for.contains(&rel) {
                anyhow::bail!("audit failed for {rel}");
            }
            Ok(self
                .reports_by_lockfile
                .get(&rel)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn update(&self, report: &AuditReport) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let dep = report.dependency.name.clone();
        if report.dependency.parents.is_empty() {
            self.record(format!("update {dep}"));
        } else {
            let parents = report
                .dependency
                .parents
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.record(format!("update {dep} parents={parents}"));
        }
        if self.fail_update_for.contains(&dep) {
            anyhow::bail!("upgrade command failed for {dep}");
        }
        if self.no_change_update_for.contains(&dep) {
            return Ok(vec![]);
        }
        Ok(vec![report.lockfile.relative_path.clone()])
    }

    fn supports_transitive_pinning(&self) -> bool {
        self.transitive_pinning
    }

    fn dependency_graph(&self, lockfile: &Lockfile) -> anyhow::Result<DependencyGraph> {
        self.record(format!("graph {}", lockfile.relative_path));
        if self.fail_graph {
            anyhow::bail!("graph resolution failed");
        }
        Ok(self.graph.clone())
    }
}

/// Scriptable in-memory git workspace recording every call.
#[derive(Default)]
pub struct FakeWorkspace {
    pub remote_branch_exists: bool,
    pub local_branch_exists: bool,
    pub authors: Vec<Author>,
    pub commit_creates: Option<bool>,
    pub fail_push: bool,
    pub fail_reset: bool,
    pub fail_pull: bool,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl FakeWorkspace {
    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl GitWorkspace for FakeWorkspace {
    fn branch_exists_local(&self, _name: &str) -> anyhow::Result<bool> {
        Ok(self.local_branch_exists)
    }

    fn branch_exists_remote(&self, _name: &str) -> anyhow::Result<bool> {
        Ok(self.remote_branch_exists)
    }

    fn create_branch(&self, name: &str, from_ref: &str) -> anyhow::Result<()> {
        self.record(format!("create {name} from {from_ref}"));
        Ok(())
    }

    fn switch_branch(&self, name: &str) -> anyhow::Result<()> {
        self.record(format!("switch {name}"));
        Ok(())
    }

    fn pull(&self, branch: &str) -> anyhow::Result<()> {
        self.record(format!("pull {branch}"));
        if self.fail_pull {
            anyhow::bail!("pull failed");
        }
        Ok(())
    }

    fn reset_branch_to_ref(&self, branch: &str, reference: &str) -> anyhow::Result<()> {
        self.record(format!("reset {branch} to {reference}"));
        if self.fail_reset {
            anyhow::bail!("reset failed");
        }
        Ok(())
    }

    fn discard_changes(&self, paths: Option<&[Utf8PathBuf]>) -> anyhow::Result<()> {
        match paths {
            Some(paths) => self.record(format!(
                "discard {}",
                paths
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            None => self.record("discard all"),
        }
        Ok(())
    }

    fn is_dirty(&self) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn is_ignored(&self, _path: &Utf8Path) -> bool {
        false
    }

    fn commit_files(&self, _files: &[Utf8PathBuf], message: &str) -> anyhow::Result<bool> {
        self.record(format!("commit {message}"));
        Ok(self.commit_creates.unwrap_or(true))
    }

    fn push(&self, branch: &str) -> anyhow::Result<()> {
        self.record(format!("push {branch}"));
        if self.fail_push {
            anyhow::bail!("push rejected");
        }
        Ok(())
    }

    fn commit_authors_between(&self, _base: &str, _tip: &str) -> anyhow::Result<Vec<Author>> {
        Ok(self.authors.clone())
    }

    fn configure_identity(&self, identity: &BotIdentity) -> anyhow::Result<()> {
        self.record(format!("identity {}", identity.email));
        Ok(())
    }
}

/// Scriptable platform client.
#[derive(Default)]
pub struct FakePlatform {
    pub open_mr: Option<String>,
    pub fail_lookup: bool,
    pub fail_upsert: bool,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl GitPlatformClient for FakePlatform {
    fn open_merge_request_url(
        &self,
        _project: &Project,
        _branch: &str,
    ) -> anyhow::Result<Option<String>> {
        self.calls.borrow_mut().push("lookup".to_string());
        if self.fail_lookup {
            anyhow::bail!("lookup failed");
        }
        Ok(self.open_mr.clone())
    }

    fn create_or_update_merge_request(
        &self,
        project: &Project,
        commit_messages: &[String],
        _branch: &str,
        remaining_vulns: &[AuditReport],
        title: &str,
    ) -> anyhow::Result<MergeRequest> {
        self.calls.borrow_mut().push(format!(
            "upsert fixes={} remaining={}",
            commit_messages.len(),
            remaining_vulns.len()
        ));
        if self.fail_upsert {
            anyhow::bail!("merge-request API rejected the request");
        }
        Ok(MergeRequest {
            title: title.to_string(),
            url: format!("{}/-/merge_requests/1", project.web_url),
            project_url: project.web_url.clone(),
            project_name: project.name.clone(),
            operation: MergeRequestOperation::Created,
        })
    }
}

/// Sink recording delivered notifications as flat strings.
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> (Box<dyn NotificationSink>, Rc<RefCell<Vec<String>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Box::new(Self {
                events: Rc::clone(&events),
            }),
            events,
        )
    }
}

impl NotificationSink for RecordingSink {
    fn failure(
        &self,
        context: &str,
        _details: &str,
        _project: Option<&Project>,
        report: Option<&AuditReport>,
        _logfile_url: Option<&str>,
    ) -> anyhow::Result<()> {
        let dep = report
            .map(|r| r.dependency.name.as_str())
            .unwrap_or("-");
        self.events
            .borrow_mut()
            .push(format!("failure:{context}:{dep}"));
        Ok(())
    }

    fn merge_request(
        &self,
        mr: &MergeRequest,
        _commit_messages: &[String],
        _remaining_vulns: &[AuditReport],
    ) -> anyhow::Result<()> {
        self.events.borrow_mut().push(format!("mr:{}", mr.url));
        Ok(())
    }

    fn project_skipped(
        &self,
        project: &Project,
        reason: &str,
        _logfile_url: Option<&str>,
    ) -> anyhow::Result<()> {
        self.events
            .borrow_mut()
            .push(format!("skipped:{}:{reason}", project.name));
        Ok(())
    }
}

/// Hook runner failing every call from `fail_from` (0-based) onward.
#[derive(Default)]
pub struct FakeHookRunner {
    pub fail_from: Option<usize>,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl HookRunner for FakeHookRunner {
    fn run(
        &self,
        hooks: &[String],
        changed_files: &[Utf8PathBuf],
        _project_root: &Utf8Path,
    ) -> anyhow::Result<()> {
        let call_index = self.calls.borrow().len();
        self.calls.borrow_mut().push(format!(
            "hooks={} files={}",
            hooks.len(),
            changed_files.len()
        ));
        if self.fail_from.is_some_and(|from| call_index >= from) {
            anyhow::bail!("hook exited non-zero");
        }
        Ok(())
    }
}

/// CI context with a fixed log URL.
#[derive(Debug, Clone, Default)]
pub struct StaticCi {
    pub url: Option<String>,
}

impl CiContext for StaticCi {
    fn logfile_url(&self) -> Option<String> {
        self.url.clone()
    }
}
