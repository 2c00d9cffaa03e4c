//! Fatal lifecycle errors.

use thiserror::Error;

use crate::github::GitHubApiError;
use crate::types::{Identity, PrNumber, RepoId};

use super::report::Phase;

/// An error that ends the run.
///
/// Non-fatal failures (issue creation, review, completion comment) never
/// become a `LifecycleError`; they are logged and recorded in the report.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// An identity could not read the repository.
    #[error("{identity} cannot access {repo}: {source}")]
    Access {
        identity: Identity,
        repo: RepoId,
        source: GitHubApiError,
    },

    /// The working branch could not be created or reset.
    #[error("failed to synchronize branch {branch}: {source}")]
    Branch {
        branch: String,
        source: GitHubApiError,
    },

    /// The file edit could not be committed.
    #[error("failed to commit {path} to {branch}: {source}")]
    Commit {
        branch: String,
        path: String,
        source: GitHubApiError,
    },

    /// Listing open pull requests failed. Creation is not attempted.
    #[error("failed to look up open pull requests for {head}: {source}")]
    Discovery {
        head: String,
        source: GitHubApiError,
    },

    /// Opening the pull request failed.
    #[error("failed to create pull request from {head}: {source}")]
    Creation {
        head: String,
        source: GitHubApiError,
    },

    /// Reading the PR's mergeability failed.
    #[error("failed to read mergeability of PR {pr}: {source}")]
    MergeabilityCheck {
        pr: PrNumber,
        source: GitHubApiError,
    },

    /// GitHub never decided whether the PR is mergeable.
    #[error("mergeability of PR {pr} still unknown after {rechecks} rechecks")]
    MergeabilityExhausted { pr: PrNumber, rechecks: u32 },

    /// GitHub reports the PR as not mergeable.
    #[error("PR {pr} has merge conflicts")]
    MergeConflict { pr: PrNumber },

    /// The squash merge was refused or failed.
    #[error("failed to merge PR {pr}: {source}")]
    Merge {
        pr: PrNumber,
        source: GitHubApiError,
    },
}

impl LifecycleError {
    /// The phase that failed.
    pub fn phase(&self) -> Phase {
        match self {
            LifecycleError::Access { .. } => Phase::Access,
            LifecycleError::Branch { .. } => Phase::Branch,
            LifecycleError::Commit { .. } => Phase::Commit,
            LifecycleError::Discovery { .. } | LifecycleError::Creation { .. } => {
                Phase::PullRequest
            }
            LifecycleError::MergeabilityCheck { .. }
            | LifecycleError::MergeabilityExhausted { .. }
            | LifecycleError::MergeConflict { .. } => Phase::Mergeability,
            LifecycleError::Merge { .. } => Phase::Merge,
        }
    }

    /// The underlying API error, if there is one.
    pub fn api_error(&self) -> Option<&GitHubApiError> {
        match self {
            LifecycleError::Access { source, .. }
            | LifecycleError::Branch { source, .. }
            | LifecycleError::Commit { source, .. }
            | LifecycleError::Discovery { source, .. }
            | LifecycleError::Creation { source, .. }
            | LifecycleError::MergeabilityCheck { source, .. }
            | LifecycleError::Merge { source, .. } => Some(source),
            LifecycleError::MergeabilityExhausted { .. } | LifecycleError::MergeConflict { .. } => {
                None
            }
        }
    }

    /// A hint for the operator, when there is something specific to do.
    pub fn remediation(&self) -> Option<String> {
        if self.api_error().is_some_and(GitHubApiError::is_unauthorized) {
            return Some("The token is invalid or expired. Generate a new one.".to_string());
        }

        match self {
            LifecycleError::Access { source, .. } if source.is_not_found() => Some(
                "This might be a private repository access issue. Check that both tokens have \
                 the \"repo\" scope and that the proposer account has been invited to the \
                 repository."
                    .to_string(),
            ),
            LifecycleError::MergeConflict { pr } => Some(format!(
                "Cannot merge PR {pr} due to conflicts. Please resolve manually."
            )),
            LifecycleError::MergeabilityExhausted { pr, .. } => Some(format!(
                "GitHub has not computed mergeability for PR {pr} yet. Retry later or \
                 inspect the PR."
            )),
            LifecycleError::Merge { pr, .. } => Some(format!(
                "Check that the approver may merge PR {pr} and that squash merging is enabled."
            )),
            _ => None,
        }
    }
}
