//! Repository access validation.

use tracing::info;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, RepositoryData};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, RepoId};

use super::{LifecycleError, perform};

/// Checks that both identities can read the repository, Proposer first.
///
/// Returns the repository metadata as seen by the Proposer, which supplies
/// the default branch for the rest of the run.
pub async fn validate_access<H>(
    hosts: &Identities<H>,
    repo: &RepoId,
) -> Result<RepositoryData, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let proposer_view = check(hosts, Identity::Proposer, repo).await?;
    check(hosts, Identity::Approver, repo).await?;
    Ok(proposer_view)
}

async fn check<H>(
    hosts: &Identities<H>,
    identity: Identity,
    repo: &RepoId,
) -> Result<RepositoryData, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let response = perform(hosts, identity, GitHubEffect::GetRepository).await;
    let data = match response {
        Ok(GitHubResponse::Repository(data)) => Ok(data),
        Ok(other) => Err(GitHubApiError::unexpected_response("get_repository", other)),
        Err(e) => Err(e),
    }
    .map_err(|source| LifecycleError::Access {
        identity,
        repo: repo.clone(),
        source,
    })?;

    info!(%identity, %repo, default_branch = %data.default_branch, "repository access confirmed");
    Ok(data)
}
