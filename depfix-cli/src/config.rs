//! Configuration file loading for depfix.
//!
//! Discovers and loads `depfix.yml`: a `defaults` block shared by every
//! project plus the project list with optional per-project overrides
//! (project-local settings win).

use anyhow::Context;
use camino::Utf8Path;
use depfix_core::settings::{DEFAULT_BRANCH_NAME, ProjectOverrides, RunSettings};
use depfix_types::{BotIdentity, Project};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "depfix.yml";

/// Top-level configuration from depfix.yml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepfixConfig {
    /// Settings shared by every project unless overridden.
    pub defaults: DefaultsConfig,

    /// Projects to process, in order.
    pub projects: Vec<ProjectConfig>,
}

/// The `defaults` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Remediation branch name.
    pub branch_name: Option<String>,

    /// Identity the bot commits under.
    pub bot: Option<BotConfig>,

    /// Pre-commit hook command lines.
    pub hooks: Vec<String>,

    /// Registered package-manager names to run.
    pub package_managers: Vec<String>,

    /// Registered platform-client name.
    pub platform: Option<String>,

    /// Registered notification-sink names.
    pub notification_sinks: Vec<String>,

    /// Keep cloned working trees on disk after the run.
    pub keep_workspace: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    pub name: String,
    pub email: String,
}

/// One project entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    pub clone_url: String,
    pub web_url: String,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    #[serde(default)]
    pub overrides: OverridesConfig,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Per-project overrides; absent fields inherit the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverridesConfig {
    pub branch_name: Option<String>,
    pub bot: Option<BotConfig>,
    pub hooks: Option<Vec<String>>,
    pub package_managers: Option<Vec<String>>,
    pub platform: Option<String>,
    pub notification_sinks: Option<Vec<String>>,
    pub keep_workspace: Option<bool>,
}

/// Load and parse a depfix.yml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DepfixConfig> {
    let contents =
        fs_err::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    let config = parse_config(&contents).with_context(|| format!("parse config file {}", path))?;
    debug!(
        projects = config.projects.len(),
        "loaded config from {path}"
    );
    Ok(config)
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<DepfixConfig> {
    let config: DepfixConfig = serde_yaml::from_str(contents).context("invalid YAML")?;
    Ok(config)
}

impl DefaultsConfig {
    /// Global run settings, filling unset fields with built-in defaults.
    pub fn to_settings(&self) -> RunSettings {
        let base = RunSettings::default();
        RunSettings {
            branch_name: self
                .branch_name
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH_NAME.to_string()),
            bot: self.bot.as_ref().map(BotConfig::to_identity).unwrap_or_default(),
            hooks: self.hooks.clone(),
            package_managers: self.package_managers.clone(),
            platform: self.platform.clone().unwrap_or(base.platform),
            sinks: if self.notification_sinks.is_empty() {
                base.sinks
            } else {
                self.notification_sinks.clone()
            },
            keep_workspace: self.keep_workspace,
        }
    }
}

impl BotConfig {
    fn to_identity(&self) -> BotIdentity {
        BotIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

impl OverridesConfig {
    pub fn to_overrides(&self) -> ProjectOverrides {
        ProjectOverrides {
            branch_name: self.branch_name.clone(),
            bot: self.bot.as_ref().map(BotConfig::to_identity),
            hooks: self.hooks.clone(),
            package_managers: self.package_managers.clone(),
            platform: self.platform.clone(),
            sinks: self.notification_sinks.clone(),
            keep_workspace: self.keep_workspace,
        }
    }
}

impl ProjectConfig {
    /// The project with no working tree bound yet.
    pub fn to_project(&self) -> Project {
        Project {
            name: self.name.clone(),
            path: None,
            default_branch: self.default_branch.clone(),
            clone_url: self.clone_url.clone(),
            web_url: self.web_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
defaults:
  branch_name: "bots/dependency-fixes"
  bot:
    name: "fixbot"
    email: "fixbot@example.com"
  hooks:
    - "pre-commit run --files"
  package_managers: ["pip", "yarn"]
  platform: "gitlab"
  notification_sinks: ["log", "chat"]
projects:
  - name: "billing"
    clone_url: "https://git.example.com/billing.git"
    web_url: "https://git.example.com/billing"
  - name: "frontend"
    clone_url: "https://git.example.com/frontend.git"
    web_url: "https://git.example.com/frontend"
    default_branch: "develop"
    overrides:
      package_managers: ["yarn"]
      keep_workspace: true
"#;

    #[test]
    fn parses_defaults_and_projects() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.projects.len(), 2);

        let settings = config.defaults.to_settings();
        assert_eq!(settings.branch_name, "bots/dependency-fixes");
        assert_eq!(settings.bot.email, "fixbot@example.com");
        assert_eq!(settings.platform, "gitlab");
        assert_eq!(settings.package_managers, vec!["pip", "yarn"]);
    }

    #[test]
    fn project_overrides_merge_over_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        let settings = config.defaults.to_settings();

        let frontend = &config.projects[1];
        let merged = settings.merged_with(&frontend.overrides.to_overrides());
        assert_eq!(merged.package_managers, vec!["yarn"]);
        assert!(merged.keep_workspace);
        // Untouched fields inherit the defaults.
        assert_eq!(merged.branch_name, "bots/dependency-fixes");
        assert_eq!(merged.hooks, vec!["pre-commit run --files"]);

        let billing = &config.projects[0];
        let merged = settings.merged_with(&billing.overrides.to_overrides());
        assert_eq!(merged.package_managers, vec!["pip", "yarn"]);
        assert!(!merged.keep_workspace);
    }

    #[test]
    fn default_branch_falls_back_to_main() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.projects[0].default_branch, "main");
        assert_eq!(config.projects[1].default_branch, "develop");
    }

    #[test]
    fn empty_defaults_use_builtins() {
        let config = parse_config("projects: []").unwrap();
        let settings = config.defaults.to_settings();
        assert_eq!(settings.branch_name, DEFAULT_BRANCH_NAME);
        assert_eq!(settings.platform, "dry-run");
        assert_eq!(settings.sinks, vec!["log"]);
        assert_eq!(settings.bot, BotIdentity::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_config("projects: []\ntypo_field: true").unwrap_err();
        assert!(format!("{err:#}").contains("invalid YAML"));
    }
}
