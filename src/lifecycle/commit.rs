//! Committing the file edit through the git data API.
//!
//! The edit is derived from the file on the default branch (not the working
//! branch), so content never compounds stale working-branch edits. All calls
//! run as the Proposer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::content::{Byline, readme};
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, TreeEntry};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, Sha};

use super::branch::branch_head;
use super::{LifecycleError, RunContext, perform};

/// The objects created by one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitBundle {
    /// Working branch head before the commit.
    pub parent: Sha,
    pub tree: Sha,
    pub commit: Sha,
    pub message: String,
}

/// Rewrites `path` on `branch` and moves the branch to the new commit.
///
/// A partially completed sequence (say, tree created but ref not moved) is a
/// failure and is not cleaned up; the orphaned objects are harmless.
pub async fn commit_change<H>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    branch: &str,
    path: &str,
    at: DateTime<Utc>,
) -> Result<CommitBundle, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let by = Byline {
        file_path: path,
        branch,
        ..ctx.byline()
    };

    commit(hosts, &ctx.default_branch, branch, path, by, at)
        .await
        .map_err(|source| LifecycleError::Commit {
            branch: branch.to_string(),
            path: path.to_string(),
            source,
        })
}

async fn commit<H>(
    hosts: &Identities<H>,
    default_branch: &str,
    branch: &str,
    path: &str,
    by: Byline<'_>,
    at: DateTime<Utc>,
) -> Result<CommitBundle, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let existing = read_file(hosts, path, default_branch).await?;
    if existing.is_none() {
        info!(path, "file not found on default branch, creating it");
    }
    let content = readme::prepend_update_section(existing.as_deref().unwrap_or(""), by, at);
    let message = readme::commit_message(by);

    let parent = branch_head(hosts, branch).await?.ok_or_else(|| {
        GitHubApiError::permanent_without_source(format!("branch {branch} disappeared"))
    })?;

    let base_tree = match call(hosts, GitHubEffect::GetTree {
        sha: parent.clone(),
        recursive: true,
    })
    .await?
    {
        GitHubResponse::Tree { sha } => sha,
        other => return Err(GitHubApiError::unexpected_response("get_tree", other)),
    };

    let tree = match call(hosts, GitHubEffect::CreateTree {
        base_tree,
        entries: vec![TreeEntry::file(path, content)],
    })
    .await?
    {
        GitHubResponse::TreeCreated { sha } => sha,
        other => return Err(GitHubApiError::unexpected_response("create_tree", other)),
    };

    let commit = match call(hosts, GitHubEffect::CreateCommit {
        message: message.clone(),
        tree: tree.clone(),
        parents: vec![parent.clone()],
    })
    .await?
    {
        GitHubResponse::CommitCreated { sha } => sha,
        other => return Err(GitHubApiError::unexpected_response("create_commit", other)),
    };

    match call(hosts, GitHubEffect::UpdateRef {
        branch: branch.to_string(),
        sha: commit.clone(),
        force: true,
    })
    .await?
    {
        GitHubResponse::RefUpdated => {}
        other => return Err(GitHubApiError::unexpected_response("update_ref", other)),
    }

    info!(branch, path, commit = %commit.short(), parent = %parent.short(), "committed file edit");
    Ok(CommitBundle {
        parent,
        tree,
        commit,
        message,
    })
}

async fn read_file<H>(
    hosts: &Identities<H>,
    path: &str,
    reference: &str,
) -> Result<Option<String>, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::GetFileContent {
        path: path.to_string(),
        reference: reference.to_string(),
    };
    match call(hosts, effect).await? {
        GitHubResponse::FileContent { content } => Ok(Some(content)),
        GitHubResponse::FileNotFound => Ok(None),
        other => Err(GitHubApiError::unexpected_response("get_file_content", other)),
    }
}

async fn call<H>(
    hosts: &Identities<H>,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    perform(hosts, Identity::Proposer, effect).await
}
