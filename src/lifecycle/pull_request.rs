//! Pull request discovery and creation.
//!
//! Discovery always runs first, and a failed discovery never falls through
//! to creation: opening a second PR for the same branch is worse than
//! stopping. All calls run as the Proposer.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::content::pull_request as text;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, PrListState};

use super::{LifecycleError, RunContext, perform};

/// The PR the rest of the run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    /// An open PR for the branch already existed.
    Existing(PrData),
    /// This run opened the PR.
    Created(PrData),
}

impl Discovered {
    pub fn pr(&self) -> &PrData {
        match self {
            Discovered::Existing(pr) | Discovered::Created(pr) => pr,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Discovered::Created(_))
    }
}

/// Returns the open PR from `branch` into the default branch, opening one if
/// there is none.
///
/// When several open PRs match, the lowest-numbered one is used.
pub async fn find_or_create<H>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    branch: &str,
    at: DateTime<Utc>,
) -> Result<Discovered, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let head = ctx.head_filter(branch);

    let open = list_open(hosts, &head, branch, &ctx.default_branch)
        .await
        .map_err(|source| LifecycleError::Discovery {
            head: head.clone(),
            source,
        })?;

    if open.len() > 1 {
        warn!(
            branch,
            count = open.len(),
            "multiple open PRs for working branch, using the oldest"
        );
    }
    if let Some(existing) = open.into_iter().min_by_key(|pr| pr.number) {
        info!(pr = %existing.number, branch, "using existing PR");
        return Ok(Discovered::Existing(existing));
    }

    let by = ctx.byline();
    let effect = GitHubEffect::CreatePr {
        title: text::title(by, at),
        body: text::body(by, at),
        head: branch.to_string(),
        base: ctx.default_branch.clone(),
    };
    let created = match perform(hosts, Identity::Proposer, effect).await {
        Ok(GitHubResponse::PrCreated(pr)) => Ok(pr),
        Ok(other) => Err(GitHubApiError::unexpected_response("create_pr", other)),
        Err(e) => Err(e),
    }
    .map_err(|source| LifecycleError::Creation { head, source })?;

    info!(pr = %created.number, branch, "opened PR");
    Ok(Discovered::Created(created))
}

async fn list_open<H>(
    hosts: &Identities<H>,
    head: &str,
    branch: &str,
    base: &str,
) -> Result<Vec<PrData>, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::ListPullRequests {
        state: PrListState::Open,
        head: head.to_string(),
        base: base.to_string(),
    };
    match perform(hosts, Identity::Proposer, effect).await? {
        // The head filter is applied server-side; re-check in case it was
        // ignored (GitHub drops it silently when malformed).
        GitHubResponse::PrList(prs) => Ok(prs
            .into_iter()
            .filter(|pr| pr.head_ref == branch && pr.base_ref == base)
            .collect()),
        other => Err(GitHubApiError::unexpected_response("list_pull_requests", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::branch::ensure_branch;
    use crate::test_utils::{FakeGitHub, test_config};

    #[tokio::test]
    async fn existing_pr_is_reused() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "main");
        let number = hosts.proposer.open_pr("jonny", "main");

        let found = find_or_create(&hosts, &ctx, "jonny", Utc::now())
            .await
            .unwrap();

        assert_eq!(found, Discovered::Existing(hosts.proposer.pr(number)));
        assert_eq!(hosts.proposer.count("create_pr"), 0);
    }

    #[tokio::test]
    async fn lowest_number_wins() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "main");
        let first = hosts.proposer.open_pr("jonny", "main");
        let _second = hosts.proposer.open_pr("jonny", "main");
        let _other_branch = hosts.proposer.open_pr("feature", "main");

        let found = find_or_create(&hosts, &ctx, "jonny", Utc::now())
            .await
            .unwrap();

        assert_eq!(found.pr().number, first);
    }

    #[tokio::test]
    async fn creates_when_none_open() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "main");
        ensure_branch(&hosts, "main", "jonny").await.unwrap();

        let found = find_or_create(&hosts, &ctx, "jonny", Utc::now())
            .await
            .unwrap();

        assert!(found.was_created());
        assert_eq!(found.pr().head_ref, "jonny");
        assert_eq!(found.pr().base_ref, "main");
        assert!(found.pr().title.starts_with("🤖 Automated PR: Update README.md from jonny"));
        assert_eq!(
            hosts.proposer.kinds(),
            vec!["get_branch", "get_branch", "create_ref", "list_pull_requests", "create_pr"]
        );
    }

    #[tokio::test]
    async fn listing_uses_owner_qualified_head_and_default_base() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "trunk");
        hosts.proposer.fail("create_pr");

        let _ = find_or_create(&hosts, &ctx, "jonny", Utc::now()).await;

        let listed = hosts
            .proposer
            .journal()
            .into_iter()
            .find_map(|(_, effect)| match effect {
                GitHubEffect::ListPullRequests { head, base, .. } => Some((head, base)),
                _ => None,
            })
            .unwrap();
        assert_eq!(listed, ("owner:jonny".to_string(), "trunk".to_string()));
    }

    #[tokio::test]
    async fn discovery_failure_never_creates() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "main");
        hosts.proposer.fail("list_pull_requests");

        let err = find_or_create(&hosts, &ctx, "jonny", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Discovery { ref head, .. } if head == "owner:jonny"));
        assert_eq!(hosts.proposer.count("create_pr"), 0);
    }

    #[tokio::test]
    async fn creation_failure_is_fatal() {
        let hosts = FakeGitHub::pair();
        let config = test_config();
        let ctx = RunContext::new(&config, "main");
        hosts.proposer.fail("create_pr");

        let err = find_or_create(&hosts, &ctx, "jonny", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Creation { .. }));
        assert_eq!(hosts.proposer.count("create_pr"), 1);
        assert!(hosts.proposer.open_prs().is_empty());
    }
}
