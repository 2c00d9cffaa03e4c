//! Squash merge and completion comment.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::content::merge as text;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, MergeMethod, PrNumber, Sha};

use super::{LifecycleError, RunContext, perform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub pr: PrNumber,
    /// The branch the PR was merged into.
    pub base: String,
    /// The squash commit on the base branch.
    pub sha: Sha,
    /// Whether the completion comment was posted.
    pub notified: bool,
}

/// Squash-merges `pr` as the Approver, then comments as the Proposer.
///
/// A failed comment is logged and reflected in `notified`; the merge still
/// counts as a success.
pub async fn merge<H>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    pr: PrNumber,
) -> Result<MergeReport, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::MergePr {
        pr,
        commit_title: text::MERGE_COMMIT_TITLE.to_string(),
        method: MergeMethod::Squash,
    };
    let sha = match perform(hosts, Identity::Approver, effect).await {
        Ok(GitHubResponse::Merged { sha }) => Ok(sha),
        Ok(other) => Err(GitHubApiError::unexpected_response("merge_pr", other)),
        Err(e) => Err(e),
    }
    .map_err(|source| LifecycleError::Merge { pr, source })?;
    let base = ctx.default_branch.clone();
    info!(%pr, %base, sha = %sha.short(), "PR merged");

    let notified = match notify(hosts, pr).await {
        Ok(()) => true,
        Err(e) => {
            warn!(%pr, error = %e, "could not post completion comment");
            false
        }
    };

    Ok(MergeReport {
        pr,
        base,
        sha,
        notified,
    })
}

async fn notify<H>(hosts: &Identities<H>, pr: PrNumber) -> Result<(), GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::PostComment {
        pr,
        body: text::completion_comment(Utc::now()),
    };
    match perform(hosts, Identity::Proposer, effect).await? {
        GitHubResponse::CommentPosted { .. } => Ok(()),
        other => Err(GitHubApiError::unexpected_response("post_comment", other)),
    }
}
