mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::ProjectConfig;
use depfix_core::adapters::{EnvCiContext, ShellGitWorkspace, ShellHookRunner, clone_project};
use depfix_core::pipeline::process_project;
use depfix_core::ports::CiContext;
use depfix_core::registry::{
    ManagerRegistry, PlatformRegistry, SinkRegistry, manager_registry, platform_registry,
    sink_registry,
};
use depfix_core::settings::RunSettings;
use depfix_types::{ProjectSummary, RemediationStatus, Severity};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "depfix",
    version,
    about = "Audit-driven remediation bot for vulnerable dependencies."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process every configured project and write the summary artifact.
    Run(RunArgs),
    /// List registered package managers, platforms, and notification sinks.
    ListAdapters,
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Configuration file (default: ./depfix.yml).
    #[arg(long, default_value = config::CONFIG_FILE_NAME)]
    config: Utf8PathBuf,

    /// Directory project working trees are cloned into
    /// (default: <tempdir>/depfix).
    #[arg(long)]
    workdir: Option<Utf8PathBuf>,

    /// Where to write the JSON summary array.
    #[arg(long, default_value = "depfix-summaries.json")]
    summaries: Utf8PathBuf,

    /// Keep cloned working trees on disk after the run.
    #[arg(long, default_value_t = false)]
    keep_workspace: bool,
}

/// The explicit registries collaborators are resolved from.
struct Registries {
    managers: ManagerRegistry,
    platforms: PlatformRegistry,
    sinks: SinkRegistry,
}

impl Registries {
    fn builtin() -> Self {
        Self {
            managers: manager_registry(),
            platforms: platform_registry(),
            sinks: sink_registry(),
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::ListAdapters => cmd_list_adapters(),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = config::load_config(&args.config)?;
    if config.projects.is_empty() {
        info!("no projects configured, nothing to do");
    }

    let registries = Registries::builtin();
    let global = config.defaults.to_settings();
    let workdir = match args.workdir {
        Some(dir) => dir,
        None => default_workdir()?,
    };

    // Strictly sequential: each working tree is exclusively owned by the
    // in-flight project run.
    let mut summaries = Vec::with_capacity(config.projects.len());
    for project_cfg in &config.projects {
        let summary = run_one_project(
            project_cfg,
            &global,
            &registries,
            &workdir,
            args.keep_workspace,
        );
        info!(
            project = summary.project_name.as_str(),
            status = %summary.status_report,
            severity = %summary.severity_score,
            mr = summary.mr_url.as_deref().unwrap_or("-"),
            "project done"
        );
        summaries.push(summary);
    }

    depfix_render::write_summaries(&args.summaries, &summaries)?;
    info!(
        path = args.summaries.as_str(),
        projects = summaries.len(),
        "summaries written"
    );
    Ok(())
}

/// One project to one summary row; a failure to even start the pipeline
/// still yields an `Error` summary so the batch accounts for every project.
fn run_one_project(
    project_cfg: &ProjectConfig,
    global: &RunSettings,
    registries: &Registries,
    workdir: &Utf8PathBuf,
    keep_workspace: bool,
) -> ProjectSummary {
    match try_run_project(project_cfg, global, registries, workdir, keep_workspace) {
        Ok(summary) => summary,
        Err(err) => {
            error!(
                project = project_cfg.name.as_str(),
                "project setup failed: {:#}", err
            );
            ProjectSummary {
                project_name: project_cfg.name.clone(),
                time_stamp: Utc::now(),
                project_url: project_cfg.web_url.clone(),
                status_report: RemediationStatus::Error,
                severity_score: Severity::Unknown,
                mr_url: None,
                logfile_url: EnvCiContext::default().logfile_url(),
            }
        }
    }
}

fn try_run_project(
    project_cfg: &ProjectConfig,
    global: &RunSettings,
    registries: &Registries,
    workdir: &Utf8PathBuf,
    keep_workspace: bool,
) -> anyhow::Result<ProjectSummary> {
    let mut settings = global.merged_with(&project_cfg.overrides.to_overrides());
    if keep_workspace {
        settings.keep_workspace = true;
    }

    let sinks = registries
        .sinks
        .resolve_all(&settings.sinks)
        .context("resolve notification sinks")?;
    let managers = registries
        .managers
        .resolve_all(&settings.package_managers)
        .context("resolve package managers")?;
    let platform = registries
        .platforms
        .resolve(&settings.platform)
        .context("resolve platform client")?;

    let dest = workdir.join(&project_cfg.name);
    if dest.exists() {
        // Stale tree from an aborted earlier run.
        fs_err::remove_dir_all(&dest).with_context(|| format!("remove stale {}", dest))?;
    }

    let mut project = project_cfg.to_project();
    project.path = Some(clone_project(&project_cfg.clone_url, &dest)?);

    let workspace = ShellGitWorkspace::new(dest);
    let hooks = ShellHookRunner;
    let ci = EnvCiContext::default();

    Ok(process_project(
        &project,
        &settings,
        &workspace,
        &managers,
        platform.as_ref(),
        &sinks,
        &hooks,
        &ci,
    ))
}

fn default_workdir() -> anyhow::Result<Utf8PathBuf> {
    let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .map_err(|p| anyhow::anyhow!("non-utf8 temp dir: {}", p.display()))?;
    Ok(temp.join("depfix"))
}

fn cmd_list_adapters() -> anyhow::Result<()> {
    let registries = Registries::builtin();
    print_names("package managers", &registries.managers.names());
    print_names("platforms", &registries.platforms.names());
    print_names("notification sinks", &registries.sinks.names());
    Ok(())
}

fn print_names(kind: &str, names: &[&str]) {
    if names.is_empty() {
        println!("{kind}: (none registered)");
    } else {
        println!("{kind}: {}", names.join(", "));
    }
}
