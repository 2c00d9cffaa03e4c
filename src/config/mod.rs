//! Run configuration.
//!
//! Everything a run needs is gathered into one immutable `RunConfig` before
//! the first API call. Raw values arrive as a `RawConfig` (filled by the CLI
//! from flags, environment variables and an optional `.env` file) and are
//! validated in one pass so that every problem is reported together.

pub mod poll;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RepoId;

pub use poll::PollConfig;

/// Default working branch.
pub const DEFAULT_BRANCH_NAME: &str = "jonny";

/// Default issue title.
pub const DEFAULT_ISSUE_TITLE: &str = "Automated Issue Creation";

/// Default issue body.
pub const DEFAULT_ISSUE_BODY: &str = "This issue was created automatically by the pull-merge bot.";

/// Default file rewritten on every run.
pub const DEFAULT_FILE_PATH: &str = "README.md";

/// Default trigger probability, in percent.
pub const DEFAULT_PROBABILITY_PERCENT: u32 = 30;

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required values were not supplied.
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// The trigger probability is outside 1..=100.
    #[error("random chance percentage must be between 1 and 100, got {0}")]
    InvalidProbability(u32),

    /// A value was supplied but is empty after trimming.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

// ─── Probability ──────────────────────────────────────────────────────────────

/// A trigger probability in whole percent, 1 through 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Probability(u8);

impl Probability {
    /// Fires on every draw.
    pub const ALWAYS: Probability = Probability(100);

    pub fn new(percent: u32) -> Result<Self, ConfigError> {
        match u8::try_from(percent) {
            Ok(p @ 1..=100) => Ok(Probability(p)),
            _ => Err(ConfigError::InvalidProbability(percent)),
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// The probability as a fraction in (0, 1].
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Probability {
    fn default() -> Self {
        Probability(DEFAULT_PROBABILITY_PERCENT as u8)
    }
}

impl TryFrom<u32> for Probability {
    type Error = ConfigError;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        Probability::new(percent)
    }
}

impl From<Probability> for u32 {
    fn from(p: Probability) -> u32 {
        u32::from(p.0)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ─── Issue kind ───────────────────────────────────────────────────────────────

/// The kind of issue to open. Also used as the issue's first label.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Bug,
    Feature,
    #[default]
    Enhancement,
}

impl IssueKind {
    pub fn as_label(self) -> &'static str {
        match self {
            IssueKind::Bug => "bug",
            IssueKind::Feature => "feature",
            IssueKind::Enhancement => "enhancement",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

// ─── Secrets ──────────────────────────────────────────────────────────────────

/// An access token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    /// The raw token, for handing to the HTTP client.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `***` followed by the last four characters.
    pub fn masked(&self) -> String {
        mask(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Masks a secret down to its last four characters.
pub fn mask(secret: &str) -> String {
    let tail: String = {
        let chars: Vec<char> = secret.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };
    format!("***{tail}")
}

// ─── RunConfig ────────────────────────────────────────────────────────────────

/// Unvalidated configuration values, as collected from the outside world.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub token_a: Option<String>,
    pub token_b: Option<String>,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    pub fork_owner: Option<String>,
    pub branch_name: Option<String>,
    pub create_issue: bool,
    pub issue_kind: Option<IssueKind>,
    pub issue_title: Option<String>,
    pub issue_body: Option<String>,
    pub enable_code_review: bool,
    pub random_chance: Option<u32>,
    pub file_path: Option<String>,
    pub max_rechecks: Option<u32>,
}

/// Issue metadata used when issue creation fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSettings {
    pub kind: IssueKind,
    pub title: String,
    pub body: String,
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Proposer credential (branch owner, PR author).
    pub proposer_token: Token,
    /// Approver credential (repository owner).
    pub approver_token: Token,
    pub repo: RepoId,
    /// Display name of the proposer, used in generated text.
    pub fork_owner: String,
    /// The working branch.
    pub branch: String,
    pub create_issue: bool,
    pub enable_code_review: bool,
    /// Chance that each gated action (issue, review) fires.
    pub probability: Probability,
    pub issue: IssueSettings,
    /// Repository path of the file rewritten on every run.
    pub file_path: String,
    pub poll: PollConfig,
}

impl RunConfig {
    /// Validates raw values, reporting every missing required field at once.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let required = [
            ("TOKEN_A", &raw.token_a),
            ("TOKEN_B", &raw.token_b),
            ("REPO_OWNER", &raw.repo_owner),
            ("REPO_NAME", &raw.repo_name),
            ("FORK_OWNER", &raw.fork_owner),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let probability =
            Probability::new(raw.random_chance.unwrap_or(DEFAULT_PROBABILITY_PERCENT))?;

        let branch = non_empty(raw.branch_name, DEFAULT_BRANCH_NAME, "BRANCH_NAME")?;
        let file_path = non_empty(raw.file_path, DEFAULT_FILE_PATH, "file path")?;

        let mut poll = PollConfig::default();
        if let Some(max) = raw.max_rechecks {
            poll.max_rechecks = max;
        }

        // Presence checked above.
        let take = |v: Option<String>| v.unwrap_or_default().trim().to_string();

        Ok(RunConfig {
            proposer_token: Token::new(take(raw.token_a)),
            approver_token: Token::new(take(raw.token_b)),
            repo: RepoId::new(take(raw.repo_owner), take(raw.repo_name)),
            fork_owner: take(raw.fork_owner),
            branch,
            create_issue: raw.create_issue,
            enable_code_review: raw.enable_code_review,
            probability,
            issue: IssueSettings {
                kind: raw.issue_kind.unwrap_or_default(),
                title: raw
                    .issue_title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ISSUE_TITLE.to_string()),
                body: raw
                    .issue_body
                    .filter(|b| !b.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ISSUE_BODY.to_string()),
            },
            file_path,
            poll,
        })
    }
}

fn non_empty(
    value: Option<String>,
    default: &str,
    name: &'static str,
) -> Result<String, ConfigError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(ConfigError::Empty(name)),
        Some(v) => Ok(v.trim().to_string()),
    }
}

/// Renders the `.env` template printed by the `setup` command.
pub fn env_template() -> String {
    format!(
        "# Required Variables\n\
         TOKEN_A=your_github_token_for_account_a\n\
         TOKEN_B=your_github_token_for_account_b\n\
         REPO_OWNER=your_repository_owner\n\
         REPO_NAME=your_repository_name\n\
         FORK_OWNER=your_fork_owner_username\n\
         \n\
         # Optional Variables\n\
         BRANCH_NAME={DEFAULT_BRANCH_NAME}\n\
         CREATE_ISSUE=false\n\
         ISSUE_TYPE=enhancement\n\
         ISSUE_TITLE={DEFAULT_ISSUE_TITLE}\n\
         ENABLE_CODE_REVIEW=false\n\
         RANDOM_CHANCE_PERCENTAGE={DEFAULT_PROBABILITY_PERCENT}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete_raw() -> RawConfig {
        RawConfig {
            token_a: Some("ghp_proposer_1234".into()),
            token_b: Some("ghp_approver_5678".into()),
            repo_owner: Some("owner".into()),
            repo_name: Some("repo".into()),
            fork_owner: Some("fork-owner".into()),
            ..RawConfig::default()
        }
    }

    #[test]
    fn defaults_applied() {
        let config = RunConfig::from_raw(complete_raw()).unwrap();
        assert_eq!(config.branch, "jonny");
        assert_eq!(config.file_path, "README.md");
        assert_eq!(config.probability.percent(), 30);
        assert_eq!(config.issue.kind, IssueKind::Enhancement);
        assert_eq!(config.issue.title, DEFAULT_ISSUE_TITLE);
        assert_eq!(config.issue.body, DEFAULT_ISSUE_BODY);
        assert!(!config.create_issue);
        assert!(!config.enable_code_review);
        assert_eq!(config.repo.to_string(), "owner/repo");
    }

    #[test]
    fn every_missing_field_is_reported() {
        let raw = RawConfig {
            token_a: Some("t".into()),
            repo_name: Some("   ".into()),
            ..RawConfig::default()
        };
        assert_eq!(
            RunConfig::from_raw(raw).unwrap_err(),
            ConfigError::Missing(vec!["TOKEN_B", "REPO_OWNER", "REPO_NAME", "FORK_OWNER"])
        );
    }

    #[test]
    fn out_of_range_probability_rejected() {
        for bad in [0, 101, 1000] {
            let raw = RawConfig {
                random_chance: Some(bad),
                ..complete_raw()
            };
            assert_eq!(
                RunConfig::from_raw(raw).unwrap_err(),
                ConfigError::InvalidProbability(bad)
            );
        }
    }

    #[test]
    fn empty_branch_rejected() {
        let raw = RawConfig {
            branch_name: Some(" ".into()),
            ..complete_raw()
        };
        assert_eq!(
            RunConfig::from_raw(raw).unwrap_err(),
            ConfigError::Empty("BRANCH_NAME")
        );
    }

    #[test]
    fn max_rechecks_override() {
        let raw = RawConfig {
            max_rechecks: Some(3),
            ..complete_raw()
        };
        assert_eq!(RunConfig::from_raw(raw).unwrap().poll.max_rechecks, 3);
    }

    #[test]
    fn debug_masks_tokens() {
        let config = RunConfig::from_raw(complete_raw()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_proposer_1234"));
        assert!(rendered.contains("***1234"));
        assert!(rendered.contains("***5678"));
    }

    #[test]
    fn mask_short_secrets() {
        assert_eq!(mask("ab"), "***ab");
        assert_eq!(mask(""), "***");
    }

    #[test]
    fn issue_kind_labels() {
        assert_eq!(IssueKind::Bug.as_label(), "bug");
        assert_eq!(IssueKind::Feature.to_string(), "feature");
    }

    #[test]
    fn template_lists_required_variables() {
        let template = env_template();
        for var in ["TOKEN_A=", "TOKEN_B=", "REPO_OWNER=", "REPO_NAME=", "FORK_OWNER="] {
            assert!(template.contains(var), "{var}");
        }
    }

    proptest! {
        #[test]
        fn probability_accepts_exactly_1_to_100(percent in 0u32..300) {
            let result = Probability::new(percent);
            prop_assert_eq!(result.is_ok(), (1..=100).contains(&percent));
            if let Ok(p) = result {
                prop_assert!(p.fraction() > 0.0 && p.fraction() <= 1.0);
            }
        }
    }
}
