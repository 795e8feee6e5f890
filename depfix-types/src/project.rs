use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A source-controlled project processed by one pipeline run.
///
/// The working tree under `path` is exclusively owned by the in-flight run
/// and removed at run end unless workspace retention is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    /// Filesystem location of the working tree. Bound only after
    /// clone/checkout; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,

    pub default_branch: String,
    pub clone_url: String,
    pub web_url: String,
}

impl Project {
    /// The checked-out working tree root, if one is bound.
    pub fn root(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }
}

/// An ecosystem lockfile discovered inside a project working tree.
///
/// Re-discovered on every run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Absolute path on disk.
    pub path: Utf8PathBuf,

    /// Project-root-relative path, used in logs and messages.
    pub relative_path: Utf8PathBuf,
}

impl Lockfile {
    pub fn new(path: Utf8PathBuf, relative_path: Utf8PathBuf) -> Self {
        Self {
            path,
            relative_path,
        }
    }
}

impl std::fmt::Display for Lockfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockfile_displays_relative_path() {
        let lf = Lockfile::new(
            Utf8PathBuf::from("/tmp/project/frontend/yarn.lock"),
            Utf8PathBuf::from("frontend/yarn.lock"),
        );
        assert_eq!(lf.to_string(), "frontend/yarn.lock");
    }

    #[test]
    fn project_root_unbound_until_checkout() {
        let mut project = Project {
            name: "billing".to_string(),
            path: None,
            default_branch: "main".to_string(),
            clone_url: "https://git.example.com/billing.git".to_string(),
            web_url: "https://git.example.com/billing".to_string(),
        };
        assert!(project.root().is_none());

        project.path = Some(Utf8PathBuf::from("/tmp/depfix/billing"));
        assert_eq!(project.root().map(|p| p.as_str()), Some("/tmp/depfix/billing"));
    }
}
