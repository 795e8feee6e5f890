//! Clap-free run settings and per-project override merging.

use depfix_types::BotIdentity;

pub const DEFAULT_BRANCH_NAME: &str = "depfix/dependency-remediation";

/// Effective settings for one project run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Name of the bot-owned remediation branch.
    pub branch_name: String,

    /// Identity the bot commits under; commits by anyone else on the
    /// remediation branch make it untouchable.
    pub bot: BotIdentity,

    /// Pre-commit hook command lines, run against changed files before each
    /// commit.
    pub hooks: Vec<String>,

    /// Registered package-manager names to run, in order.
    pub package_managers: Vec<String>,

    /// Registered platform-client name.
    pub platform: String,

    /// Registered notification-sink names.
    pub sinks: Vec<String>,

    /// Keep the cloned working tree on disk after the run (debug aid).
    pub keep_workspace: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            branch_name: DEFAULT_BRANCH_NAME.to_string(),
            bot: BotIdentity::default(),
            hooks: Vec::new(),
            package_managers: Vec::new(),
            platform: "dry-run".to_string(),
            sinks: vec!["log".to_string()],
            keep_workspace: false,
        }
    }
}

/// Project-local settings, merged over the globals field-wise.
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub branch_name: Option<String>,
    pub bot: Option<BotIdentity>,
    pub hooks: Option<Vec<String>>,
    pub package_managers: Option<Vec<String>>,
    pub platform: Option<String>,
    pub sinks: Option<Vec<String>>,
    pub keep_workspace: Option<bool>,
}

impl RunSettings {
    /// Project-local settings win; absent fields inherit the global value.
    pub fn merged_with(&self, overrides: &ProjectOverrides) -> RunSettings {
        RunSettings {
            branch_name: overrides
                .branch_name
                .clone()
                .unwrap_or_else(|| self.branch_name.clone()),
            bot: overrides.bot.clone().unwrap_or_else(|| self.bot.clone()),
            hooks: overrides.hooks.clone().unwrap_or_else(|| self.hooks.clone()),
            package_managers: overrides
                .package_managers
                .clone()
                .unwrap_or_else(|| self.package_managers.clone()),
            platform: overrides
                .platform
                .clone()
                .unwrap_or_else(|| self.platform.clone()),
            sinks: overrides.sinks.clone().unwrap_or_else(|| self.sinks.clone()),
            keep_workspace: overrides.keep_workspace.unwrap_or(self.keep_workspace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_use_builtin_identity_and_branch() {
        let settings = RunSettings::default();
        assert_eq!(settings.branch_name, DEFAULT_BRANCH_NAME);
        assert_eq!(settings.bot, BotIdentity::default());
        assert_eq!(settings.sinks, vec!["log".to_string()]);
        assert!(!settings.keep_workspace);
    }

    #[test]
    fn overrides_win_field_wise() {
        let global = RunSettings {
            package_managers: vec!["pip".to_string()],
            hooks: vec!["make fmt".to_string()],
            ..RunSettings::default()
        };
        let overrides = ProjectOverrides {
            branch_name: Some("custom/fixes".to_string()),
            package_managers: Some(vec!["yarn".to_string()]),
            keep_workspace: Some(true),
            ..ProjectOverrides::default()
        };

        let merged = global.merged_with(&overrides);
        assert_eq!(merged.branch_name, "custom/fixes");
        assert_eq!(merged.package_managers, vec!["yarn".to_string()]);
        assert!(merged.keep_workspace);
        // Untouched fields inherit.
        assert_eq!(merged.hooks, vec!["make fmt".to_string()]);
        assert_eq!(merged.platform, global.platform);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let global = RunSettings::default();
        let merged = global.merged_with(&ProjectOverrides::default());
        assert_eq!(merged.branch_name, global.branch_name);
        assert_eq!(merged.sinks, global.sinks);
    }
}
