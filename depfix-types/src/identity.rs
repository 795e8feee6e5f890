use serde::{Deserialize, Serialize};

/// Author of a commit, as reported by the version-control system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Git identity the bot commits under.
///
/// Commits on the remediation branch are compared against this identity;
/// anything authored by somebody else makes the branch untouchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub name: String,
    pub email: String,
}

pub const DEFAULT_BOT_NAME: &str = "depfix bot";
pub const DEFAULT_BOT_EMAIL: &str = "depfix-bot@noreply.invalid";

impl Default for BotIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_BOT_NAME.to_string(),
            email: DEFAULT_BOT_EMAIL.to_string(),
        }
    }
}

impl BotIdentity {
    /// Email match is case-insensitive; name match is exact.
    pub fn matches(&self, author: &Author) -> bool {
        author.email.eq_ignore_ascii_case(&self.email) || author.name == self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str, email: &str) -> Author {
        Author {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn email_match_is_case_insensitive() {
        let bot = BotIdentity {
            name: "depfix bot".to_string(),
            email: "bot@example.com".to_string(),
        };
        assert!(bot.matches(&author("Somebody Else", "BOT@Example.COM")));
    }

    #[test]
    fn name_match_is_exact() {
        let bot = BotIdentity {
            name: "depfix bot".to_string(),
            email: "bot@example.com".to_string(),
        };
        assert!(bot.matches(&author("depfix bot", "other@example.com")));
        assert!(!bot.matches(&author("Depfix Bot", "other@example.com")));
    }

    #[test]
    fn foreign_author_does_not_match() {
        let bot = BotIdentity::default();
        assert!(!bot.matches(&author("Alice", "alice@example.com")));
    }
}
