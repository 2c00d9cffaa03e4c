//! Pull request and review types.

use serde::{Deserialize, Serialize};

/// GitHub's asynchronous verdict on whether a pull request can be merged.
///
/// The REST API reports `mergeable` as `true`, `false`, or `null` while the
/// background mergeability job is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mergeable {
    /// Can be merged without conflicts.
    Yes,

    /// Has conflicts with the base branch. Terminal for the bot: a human has
    /// to resolve them.
    No,

    /// Not yet computed by GitHub - wait and re-check.
    Unknown,
}

impl Mergeable {
    /// Returns true once GitHub has reached a verdict.
    pub fn is_decided(self) -> bool {
        !matches!(self, Mergeable::Unknown)
    }
}

impl From<Option<bool>> for Mergeable {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Mergeable::Yes,
            Some(false) => Mergeable::No,
            None => Mergeable::Unknown,
        }
    }
}

/// How a pull request is merged into its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    /// Returns the value GitHub's merge endpoint expects for `merge_method`.
    pub fn as_api_str(self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

/// The kind of review being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    /// A review that only leaves a comment.
    Comment,
    /// An approving review.
    Approve,
}

impl ReviewEvent {
    /// Returns the value GitHub's review endpoint expects for `event`.
    pub fn as_api_str(self) -> &'static str {
        match self {
            ReviewEvent::Comment => "COMMENT",
            ReviewEvent::Approve => "APPROVE",
        }
    }
}

/// Which pull requests a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrListState {
    Open,
    Closed,
    All,
}

impl PrListState {
    pub fn as_api_str(self) -> &'static str {
        match self {
            PrListState::Open => "open",
            PrListState::Closed => "closed",
            PrListState::All => "all",
        }
    }
}
