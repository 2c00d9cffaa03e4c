//! Working branch synchronization.
//!
//! All calls run as the Proposer.

use serde::Serialize;
use tracing::info;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, Sha};

use super::{LifecycleError, perform};

/// What `ensure_branch` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BranchSync {
    /// The branch did not exist and now points at the default head.
    Created { head: Sha },
    /// The branch existed and was force-reset to the default head.
    Reset { previous_head: Sha, head: Sha },
}

/// Makes `branch` point at the current head of `default_branch`.
///
/// Any commits on the working branch that are not on the default branch are
/// discarded.
pub async fn ensure_branch<H>(
    hosts: &Identities<H>,
    default_branch: &str,
    branch: &str,
) -> Result<BranchSync, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    sync(hosts, default_branch, branch)
        .await
        .map_err(|source| LifecycleError::Branch {
            branch: branch.to_string(),
            source,
        })
}

async fn sync<H>(
    hosts: &Identities<H>,
    default_branch: &str,
    branch: &str,
) -> Result<BranchSync, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    if branch == default_branch {
        return Err(GitHubApiError::permanent_without_source(format!(
            "working branch {branch} is the default branch"
        )));
    }

    let existing = branch_head(hosts, branch).await?;
    let default_head = branch_head(hosts, default_branch).await?.ok_or_else(|| {
        GitHubApiError::permanent_without_source(format!(
            "default branch {default_branch} not found"
        ))
    })?;

    match existing {
        Some(previous_head) => {
            let effect = GitHubEffect::UpdateRef {
                branch: branch.to_string(),
                sha: default_head.clone(),
                force: true,
            };
            expect_response(perform(hosts, Identity::Proposer, effect).await?, |r| {
                matches!(r, GitHubResponse::RefUpdated)
            })?;
            info!(
                branch,
                from = %previous_head.short(),
                to = %default_head.short(),
                "reset working branch to default head"
            );
            Ok(BranchSync::Reset {
                previous_head,
                head: default_head,
            })
        }
        None => {
            let effect = GitHubEffect::CreateRef {
                branch: branch.to_string(),
                sha: default_head.clone(),
            };
            expect_response(perform(hosts, Identity::Proposer, effect).await?, |r| {
                matches!(r, GitHubResponse::RefCreated)
            })?;
            info!(branch, head = %default_head.short(), "created working branch");
            Ok(BranchSync::Created { head: default_head })
        }
    }
}

/// Looks up a branch head. `None` if the branch does not exist.
pub(crate) async fn branch_head<H>(
    hosts: &Identities<H>,
    branch: &str,
) -> Result<Option<Sha>, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::GetBranch {
        branch: branch.to_string(),
    };
    match perform(hosts, Identity::Proposer, effect).await? {
        GitHubResponse::Branch(data) => Ok(Some(data.head)),
        GitHubResponse::BranchNotFound => Ok(None),
        other => Err(GitHubApiError::unexpected_response("get_branch", other)),
    }
}

fn expect_response(
    response: GitHubResponse,
    ok: impl FnOnce(&GitHubResponse) -> bool,
) -> Result<(), GitHubApiError> {
    if ok(&response) {
        Ok(())
    } else {
        Err(GitHubApiError::unexpected_response("ref update", response))
    }
}
