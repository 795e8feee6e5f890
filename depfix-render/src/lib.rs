//! Rendering helpers for human-readable and persisted artifacts.

use anyhow::Context;
use camino::Utf8Path;
use depfix_types::{AuditReport, Project, ProjectSummary};

/// Generated message for one remediation commit.
///
/// Transitive fixes name the bumped parents; direct fixes name the version
/// hop. Advisory ids are appended when known.
pub fn commit_message(report: &AuditReport) -> String {
    let dep = &report.dependency;
    let ids = advisory_ids(report);

    let mut message = if dep.parents.is_empty() {
        match &report.fixed_version {
            Some(fixed) => format!("Update {} from {} to {}", dep.name, dep.version, fixed),
            None => format!("Update {} {}", dep.name, dep.version),
        }
    } else {
        let parents = dep
            .parents
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Update {} to remediate transitive {} {}",
            parents, dep.name, dep.version
        )
    };

    if !ids.is_empty() {
        message.push_str(&format!(" ({})", ids.join(", ")));
    }
    message
}

/// Stable title used for create-or-update matching on the platform.
pub fn mr_title(project: &Project) -> String {
    format!("Remediate vulnerable dependencies in {}", project.name)
}

/// Markdown body for the merge request: applied fixes plus the residual
/// vulnerability set.
pub fn render_mr_description(commit_messages: &[String], remaining: &[AuditReport]) -> String {
    let mut out = String::new();
    out.push_str("## Applied fixes\n\n");
    if commit_messages.is_empty() {
        out.push_str("_No fixes were applied._\n");
    } else {
        for message in commit_messages {
            out.push_str(&format!("- {}\n", message));
        }
    }

    out.push_str("\n## Remaining vulnerabilities\n\n");
    if remaining.is_empty() {
        out.push_str("_None._\n");
        return out;
    }

    for report in remaining {
        let dep = &report.dependency;
        out.push_str(&format!(
            "- `{}` {} in `{}` (severity `{}`)\n",
            dep.name, dep.version, report.lockfile.relative_path, report.severity
        ));
        for detail in &report.details {
            out.push_str(&format!("  - {}", detail.id));
            if !detail.description.is_empty() {
                out.push_str(&format!(": {}", detail.description));
            }
            out.push('\n');
        }
        if let Some(fixed) = &report.fixed_version {
            out.push_str(&format!("  - fixed in {}\n", fixed));
        }
        if let Some(reason) = &report.fix_skip_reason {
            out.push_str(&format!("  - not fixed here: {}\n", reason));
        }
    }

    out
}

/// Serialize the batch summaries as one pretty-printed JSON array.
pub fn render_summaries(summaries: &[ProjectSummary]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(summaries).context("serialize summaries")
}

/// Write the summary artifact, creating parent directories as needed.
pub fn write_summaries(path: &Utf8Path, summaries: &[ProjectSummary]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent).with_context(|| format!("create parent dir for {}", path))?;
    }
    let json = render_summaries(summaries)?;
    fs_err::write(path, json).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn advisory_ids(report: &AuditReport) -> Vec<&str> {
    report.details.iter().map(|d| d.id.as_str()).collect()
}
