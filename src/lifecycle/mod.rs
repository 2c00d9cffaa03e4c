//! The change-proposal lifecycle.
//!
//! One run moves forward through a fixed sequence of phases:
//!
//! 1. **Access**: both identities can read the repository
//! 2. **Issue** (optional, gated): open an issue
//! 3. **Branch**: create the working branch, or force-reset it to the
//!    default branch head
//! 4. **Commit**: rewrite the target file on the working branch
//! 5. **Pull request**: reuse the open PR for the branch, or open one
//! 6. **Review** (optional, gated): COMMENT review, then APPROVE review
//! 7. **Mergeability**: poll until GitHub decides whether the PR merges
//! 8. **Merge**: squash-merge, then post a completion comment
//!
//! # Identities
//!
//! Every hosting call names the identity it runs as. The Proposer performs
//! everything except the approval and the merge, which the Approver performs.
//!
//! # Failure policy
//!
//! Phases 1, 3, 4, 5, 7 and 8's merge are fatal: the run stops and nothing is
//! rolled back. Issue creation, review and the completion comment are
//! best-effort. Every phase can be re-run from the top: the branch is reset
//! to the default head and content is re-derived from the default branch.

pub mod access;
pub mod branch;
pub mod commit;
pub mod error;
pub mod gate;
pub mod issue;
pub mod merge;
pub mod mergeability;
pub mod orchestrator;
pub mod pull_request;
pub mod report;
pub mod review;


pub use branch::BranchSync;
pub use commit::CommitBundle;
pub use error::LifecycleError;
pub use gate::{ProbabilityGate, Sampler, ThreadRngSampler};
pub use merge::MergeReport;
pub use mergeability::PollOutcome;
pub use orchestrator::Orchestrator;
pub use pull_request::Discovered;
pub use report::{Phase, PhaseRecord, PhaseStatus, RunReport};
pub use review::ReviewOutcome;

#[cfg(test)]
pub(crate) use gate::ScriptedSampler;

use tracing::debug;

use crate::config::RunConfig;
use crate::content::Byline;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity};

/// Facts shared by the phases of one run.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    /// The repository's default branch, as reported during access validation.
    pub default_branch: String,
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a RunConfig, default_branch: impl Into<String>) -> Self {
        RunContext {
            config,
            default_branch: default_branch.into(),
        }
    }

    pub fn byline(&self) -> Byline<'a> {
        Byline::from_config(self.config)
    }

    /// The `owner:branch` head filter for listing pull requests.
    pub fn head_filter(&self, branch: &str) -> String {
        format!("{}:{}", self.config.repo.owner, branch)
    }
}

/// Executes one effect as the given identity.
pub(crate) async fn perform<H>(
    hosts: &Identities<H>,
    identity: Identity,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    debug!(%identity, effect = effect.kind(), "calling GitHub");
    hosts.get(identity).interpret(effect).await
}
