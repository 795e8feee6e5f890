//! The audit→fix→commit→re-audit loop.
//!
//! Failure handling is deliberately asymmetric. Install, audit, and hook
//! failures are local: one lockfile or one commit is skipped and the loop
//! keeps going. An update or re-audit failure may leave the working tree
//! half-modified, so it aborts everything still pending for the project
//! rather than building on top of an inconsistent tree.

use crate::notify;
use crate::ports::{CiContext, GitWorkspace, HookRunner, NotificationSink, PackageManagerAdapter};
use crate::settings::RunSettings;
use depfix_domain::attach_parent_bumps;
use depfix_types::{AuditFixOutcome, AuditReport, Lockfile, Project, RemediationStatus, Severity};
use tracing::{debug, error, info};

/// Control tag produced by each fallible stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageControl {
    /// Proceed with the next unit of work.
    Proceed,
    /// Abandon the current lockfile, continue with the next one.
    SkipLockfile,
    /// Abandon all remaining work for the project.
    AbortProject,
}

/// Accumulator threaded through every stage.
#[derive(Debug, Default)]
struct LoopState {
    severity: Severity,
    commit_messages: Vec<String>,
    remaining: Vec<AuditReport>,
    status: RemediationStatus,
}

impl LoopState {
    fn into_outcome(self) -> AuditFixOutcome {
        AuditFixOutcome {
            severity: self.severity,
            commit_messages: self.commit_messages,
            remaining_vulns: self.remaining,
            status: self.status,
        }
    }
}

/// Run every configured package manager over every lockfile it discovers.
///
/// Returns the accumulated outcome; `status` starts `Clean` and is
/// downgraded to `Error` by any stage failure.
pub fn run_audit_fix(
    project: &Project,
    managers: &[Box<dyn PackageManagerAdapter>],
    settings: &RunSettings,
    workspace: &dyn GitWorkspace,
    hooks: &dyn HookRunner,
    sinks: &[Box<dyn NotificationSink>],
    ci: &dyn CiContext,
) -> AuditFixOutcome {
    let mut state = LoopState::default();

    'managers: for manager in managers {
        let lockfiles = match manager.find_lockfiles(project, workspace) {
            Ok(lockfiles) => lockfiles,
            Err(err) => {
                stage_failure(&mut state, sinks, ci, project, "discover lockfiles", &err, None);
                continue;
            }
        };
        debug!(
            manager = manager.name(),
            project = project.name.as_str(),
            count = lockfiles.len(),
            "discovered lockfiles"
        );

        for lockfile in &lockfiles {
            match process_lockfile(
                &mut state,
                project,
                manager.as_ref(),
                lockfile,
                settings,
                workspace,
                hooks,
                sinks,
                ci,
            ) {
                StageControl::Proceed | StageControl::SkipLockfile => {}
                StageControl::AbortProject => break 'managers,
            }
        }
    }

    state.into_outcome()
}

#[allow(clippy::too_many_arguments)]
fn process_lockfile(
    state: &mut LoopState,
    project: &Project,
    manager: &dyn PackageManagerAdapter,
    lockfile: &Lockfile,
    settings: &RunSettings,
    workspace: &dyn GitWorkspace,
    hooks: &dyn HookRunner,
    sinks: &[Box<dyn NotificationSink>],
    ci: &dyn CiContext,
) -> StageControl {
    info!(
        manager = manager.name(),
        lockfile = %lockfile,
        "processing lockfile"
    );

    if let Err(err) = manager.install(lockfile) {
        stage_failure(state, sinks, ci, project, "install dependencies", &err, None);
        return StageControl::SkipLockfile;
    }

    let mut reports = match manager.audit(lockfile, false) {
        Ok(reports) => reports,
        Err(err) => {
            stage_failure(state, sinks, ci, project, "audit", &err, None);
            return StageControl::SkipLockfile;
        }
    };
    if reports.is_empty() {
        debug!(lockfile = %lockfile, "no vulnerabilities found");
        return StageControl::Proceed;
    }

    for report in &reports {
        if report.severity > state.severity {
            state.severity = report.severity;
        }
    }

    // Ecosystems that cannot re-pin a transitive package need the fix
    // retargeted at the direct dependencies pulling it in.
    if !manager.supports_transitive_pinning()
        && reports.iter().any(|r| r.dependency.kind.is_transitive())
    {
        match manager.dependency_graph(lockfile) {
            Ok(graph) => attach_parent_bumps(&mut reports, &graph),
            Err(err) => {
                stage_failure(state, sinks, ci, project, "resolve dependency graph", &err, None);
                return StageControl::SkipLockfile;
            }
        }
    }

    let mut commits_for_lockfile = 0usize;
    let mut abort = false;
    for report in &reports {
        match apply_report(
            state,
            project,
            manager,
            report,
            settings,
            workspace,
            hooks,
            sinks,
            ci,
            &mut commits_for_lockfile,
        ) {
            StageControl::Proceed | StageControl::SkipLockfile => {}
            StageControl::AbortProject => {
                abort = true;
                break;
            }
        }
    }

    // The residual set: a fresh scan when something was committed, the
    // unchanged original reports when nothing was. The re-audit still runs
    // on the abort path so partial progress is reflected.
    if commits_for_lockfile > 0 {
        match manager.audit(lockfile, true) {
            Ok(fresh) => {
                debug!(
                    lockfile = %lockfile,
                    residual = fresh.len(),
                    "re-audit complete"
                );
                state.remaining.extend(fresh);
            }
            Err(err) => {
                stage_failure(state, sinks, ci, project, "re-audit", &err, None);
                return StageControl::AbortProject;
            }
        }
    } else {
        state.remaining.extend(reports.iter().cloned());
    }

    if abort {
        StageControl::AbortProject
    } else {
        StageControl::Proceed
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_report(
    state: &mut LoopState,
    project: &Project,
    manager: &dyn PackageManagerAdapter,
    report: &AuditReport,
    settings: &RunSettings,
    workspace: &dyn GitWorkspace,
    hooks: &dyn HookRunner,
    sinks: &[Box<dyn NotificationSink>],
    ci: &dyn CiContext,
    commits: &mut usize,
) -> StageControl {
    // A skip reason means no fix is to be attempted here, whether the
    // audit said so or a broader parent bump already covers this report.
    if let Some(reason) = &report.fix_skip_reason {
        debug!(
            dependency = report.dependency.name.as_str(),
            "fix skipped: {reason}"
        );
        return StageControl::Proceed;
    }

    let changed = match manager.update(report) {
        Ok(changed) => changed,
        Err(err) => {
            stage_failure(state, sinks, ci, project, "update", &err, Some(report));
            return StageControl::AbortProject;
        }
    };
    if changed.is_empty() {
        debug!(
            dependency = report.dependency.name.as_str(),
            "update produced no changes"
        );
        return StageControl::Proceed;
    }

    if !settings.hooks.is_empty()
        && let Some(root) = project.root()
        && let Err(err) = hooks.run(&settings.hooks, &changed, root)
    {
        stage_failure(state, sinks, ci, project, "pre-commit hooks", &err, Some(report));
        // Skip only this report's commit; prior commits stay intact.
        if let Err(err) = workspace.discard_changes(Some(&changed)) {
            error!("discard after hook failure: {:#}", err);
        }
        return StageControl::Proceed;
    }

    let message = depfix_render::commit_message(report);
    match workspace.commit_files(&changed, &message) {
        Ok(true) => {
            info!(
                dependency = report.dependency.name.as_str(),
                "committed: {message}"
            );
            state.commit_messages.insert(0, message);
            *commits += 1;
        }
        Ok(false) => {
            debug!(
                dependency = report.dependency.name.as_str(),
                "no-op diff, no commit created"
            );
        }
        Err(err) => {
            stage_failure(state, sinks, ci, project, "commit", &err, Some(report));
        }
    }

    // Whatever the update touched beyond the commit must not leak into the
    // next report's diff.
    if let Err(err) = workspace.discard_changes(None) {
        error!("discard stray changes: {:#}", err);
    }

    StageControl::Proceed
}

fn stage_failure(
    state: &mut LoopState,
    sinks: &[Box<dyn NotificationSink>],
    ci: &dyn CiContext,
    project: &Project,
    context: &str,
    err: &anyhow::Error,
    report: Option<&AuditReport>,
) {
    error!(
        project = project.name.as_str(),
        context, "stage failed: {:#}", err
    );
    let logfile_url = ci.logfile_url();
    notify::failure(
        sinks,
        context,
        &format!("{err:#}"),
        Some(project),
        report,
        logfile_url.as_deref(),
    );
    state.status.downgrade(RemediationStatus::Error);
}
