//! Per-project remediation pipeline.
//!
//! The entry point is I/O-agnostic: all git, platform, and package-manager
//! operations are performed through the port traits. Every code path,
//! including the error path, yields exactly one [`ProjectSummary`].

use crate::audit_loop::run_audit_fix;
use crate::notify;
use crate::ports::{
    CiContext, GitPlatformClient, GitWorkspace, HookRunner, NotificationSink,
    PackageManagerAdapter,
};
use crate::settings::RunSettings;
use anyhow::Context;
use chrono::Utc;
use depfix_types::{Author, Project, ProjectSummary, RemediationStatus, Severity};
use tracing::{debug, error, info, warn};

/// Process one project to a terminal summary. Never fails: anything escaping
/// the inner state machine is caught here and converted to an `Error`
/// summary, so one project can never abort a multi-project batch. The
/// working tree is cleaned up on every path unless retention is configured.
#[allow(clippy::too_many_arguments)]
pub fn process_project(
    project: &Project,
    settings: &RunSettings,
    workspace: &dyn GitWorkspace,
    managers: &[Box<dyn PackageManagerAdapter>],
    platform: &dyn GitPlatformClient,
    sinks: &[Box<dyn NotificationSink>],
    hooks: &dyn HookRunner,
    ci: &dyn CiContext,
) -> ProjectSummary {
    info!(project = project.name.as_str(), "processing project");
    let logfile_url = ci.logfile_url();

    let summary = match run_project(
        project, settings, workspace, managers, platform, sinks, hooks, ci,
    ) {
        Ok(summary) => summary,
        Err(err) => {
            error!(
                project = project.name.as_str(),
                "remediation failed: {:#}", err
            );
            notify::failure(
                sinks,
                "remediation pipeline",
                &format!("{err:#}"),
                Some(project),
                None,
                logfile_url.as_deref(),
            );
            summarize(
                project,
                RemediationStatus::Error,
                Severity::Unknown,
                None,
                logfile_url.clone(),
            )
        }
    };

    cleanup_workspace(project, settings);
    summary
}

#[allow(clippy::too_many_arguments)]
fn run_project(
    project: &Project,
    settings: &RunSettings,
    workspace: &dyn GitWorkspace,
    managers: &[Box<dyn PackageManagerAdapter>],
    platform: &dyn GitPlatformClient,
    sinks: &[Box<dyn NotificationSink>],
    hooks: &dyn HookRunner,
    ci: &dyn CiContext,
) -> anyhow::Result<ProjectSummary> {
    let logfile_url = ci.logfile_url();
    let branch = settings.branch_name.as_str();

    workspace
        .configure_identity(&settings.bot)
        .context("configure bot identity")?;

    let mut existing_mr: Option<String> = None;

    if workspace
        .branch_exists_remote(branch)
        .context("check remote branch")?
    {
        if !workspace
            .branch_exists_local(branch)
            .context("check local branch")?
        {
            workspace
                .create_branch(branch, &format!("origin/{branch}"))
                .context("track remote branch")?;
        }
        workspace.switch_branch(branch).context("switch branch")?;
        workspace.pull(branch).context("pull branch")?;

        // Informational only; a failed lookup must not weaken the guard.
        existing_mr = match platform.open_merge_request_url(project, branch) {
            Ok(url) => url,
            Err(err) => {
                warn!("open merge-request lookup failed: {:#}", err);
                None
            }
        };

        let authors = workspace
            .commit_authors_between(&project.default_branch, branch)
            .context("list branch authors")?;
        let foreign = foreign_authors(&authors, settings);
        if !foreign.is_empty() {
            // Somebody committed onto the bot branch by hand. Touching it
            // now would overwrite their work; back out before any
            // install/audit/update runs.
            let reason = format!(
                "manual commits on {} by {}",
                branch,
                foreign
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            info!(project = project.name.as_str(), "skipping project: {reason}");
            notify::project_skipped(sinks, project, &reason, logfile_url.as_deref());
            return Ok(summarize(
                project,
                RemediationStatus::ManualChanges,
                Severity::Unknown,
                existing_mr,
                logfile_url,
            ));
        }

        // Only bot commits (or none) on the branch: discard and rebuild it
        // from the default branch tip, so repeated runs converge instead of
        // accumulating drift.
        workspace
            .reset_branch_to_ref(branch, &project.default_branch)
            .context("reset branch to default tip")?;
    } else {
        workspace
            .create_branch(branch, &project.default_branch)
            .context("create branch")?;
        workspace.switch_branch(branch).context("switch branch")?;
    }

    let outcome = run_audit_fix(project, managers, settings, workspace, hooks, sinks, ci);

    let mut status = outcome.status;
    let mut mr_url = None;

    if outcome.commit_messages.is_empty() && outcome.remaining_vulns.is_empty() {
        debug!(
            project = project.name.as_str(),
            "no fixes and no residual vulnerabilities, nothing to push"
        );
    } else {
        workspace.push(branch).context("push branch")?;

        let title = depfix_render::mr_title(project);
        match platform.create_or_update_merge_request(
            project,
            &outcome.commit_messages,
            branch,
            &outcome.remaining_vulns,
            &title,
        ) {
            Ok(mr) => {
                info!(url = mr.url.as_str(), "merge request ready");
                mr_url = Some(mr.url.clone());
                notify::merge_request(sinks, &mr, &outcome.commit_messages, &outcome.remaining_vulns);
                if outcome.remaining_vulns.is_empty() {
                    status.downgrade(RemediationStatus::MrPending);
                } else {
                    status.downgrade(RemediationStatus::VulnsLeft);
                }
            }
            Err(err) => {
                error!("merge-request upsert failed: {:#}", err);
                notify::failure(
                    sinks,
                    "merge request",
                    &format!("{err:#}"),
                    Some(project),
                    None,
                    logfile_url.as_deref(),
                );
                status.downgrade(RemediationStatus::Error);
                mr_url = None;
            }
        }
    }

    Ok(summarize(
        project,
        status,
        outcome.severity,
        mr_url,
        logfile_url,
    ))
}

fn foreign_authors<'a>(authors: &'a [Author], settings: &RunSettings) -> Vec<&'a Author> {
    authors
        .iter()
        .filter(|author| !settings.bot.matches(author))
        .collect()
}

fn summarize(
    project: &Project,
    status: RemediationStatus,
    severity: Severity,
    mr_url: Option<String>,
    logfile_url: Option<String>,
) -> ProjectSummary {
    ProjectSummary {
        project_name: project.name.clone(),
        time_stamp: Utc::now(),
        project_url: project.web_url.clone(),
        status_report: status,
        severity_score: severity,
        mr_url,
        logfile_url,
    }
}

fn cleanup_workspace(project: &Project, settings: &RunSettings) {
    if settings.keep_workspace {
        debug!(
            project = project.name.as_str(),
            "keeping workspace directory"
        );
        return;
    }
    let Some(path) = project.root() else {
        return;
    };
    if !path.exists() {
        return;
    }
    if let Err(err) = fs_err::remove_dir_all(path) {
        warn!(path = path.as_str(), "workspace cleanup failed: {:#}", err);
    }
}
