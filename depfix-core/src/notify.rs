//! Broadcast helpers over the configured notification sinks.
//!
//! A sink that fails to deliver is logged and skipped; alerting must never
//! take a project run down with it.

use crate::ports::NotificationSink;
use depfix_types::{AuditReport, MergeRequest, Project};
use tracing::warn;

pub fn failure(
    sinks: &[Box<dyn NotificationSink>],
    context: &str,
    details: &str,
    project: Option<&Project>,
    report: Option<&AuditReport>,
    logfile_url: Option<&str>,
) {
    for sink in sinks {
        if let Err(err) = sink.failure(context, details, project, report, logfile_url) {
            warn!(context, "failure notification not delivered: {:#}", err);
        }
    }
}

pub fn merge_request(
    sinks: &[Box<dyn NotificationSink>],
    mr: &MergeRequest,
    commit_messages: &[String],
    remaining_vulns: &[AuditReport],
) {
    for sink in sinks {
        if let Err(err) = sink.merge_request(mr, commit_messages, remaining_vulns) {
            warn!(mr_url = mr.url.as_str(), "merge-request notification not delivered: {:#}", err);
        }
    }
}

pub fn project_skipped(
    sinks: &[Box<dyn NotificationSink>],
    project: &Project,
    reason: &str,
    logfile_url: Option<&str>,
) {
    for sink in sinks {
        if let Err(err) = sink.project_skipped(project, reason, logfile_url) {
            warn!(
                project = project.name.as_str(),
                "skip notification not delivered: {:#}", err
            );
        }
    }
}
