//! Simulated code review.
//!
//! When enabled and the gate fires, the Proposer reads the PR and its changed
//! files and leaves a COMMENT review summarizing them; the Approver then
//! leaves an APPROVE review. A review failure never stops the run.

use serde::Serialize;
use tracing::{info, warn};

use crate::content::review as text;
use crate::effects::{ChangedFile, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, PrNumber, ReviewEvent};

use super::gate::{ProbabilityGate, Sampler};
use super::{RunContext, perform};

/// Why no review was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    NotTriggered,
}

/// What the review gate did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Skipped { reason: SkipReason },
    Reviewed { files: usize, notes: usize },
    Failed { reason: String },
}

/// Draws once and, if the draw fires, reviews and approves `pr`.
pub async fn maybe_review<H, S>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    gate: &ProbabilityGate<S>,
    pr: PrNumber,
) -> ReviewOutcome
where
    H: GitHubInterpreter<Error = GitHubApiError>,
    S: Sampler,
{
    if !ctx.config.enable_code_review {
        return ReviewOutcome::Skipped {
            reason: SkipReason::Disabled,
        };
    }
    if !gate.draw() {
        info!(%pr, probability = %gate.probability(), "review not triggered");
        return ReviewOutcome::Skipped {
            reason: SkipReason::NotTriggered,
        };
    }

    info!(%pr, reviewer = %ctx.config.fork_owner, "review triggered");
    match review(hosts, ctx, pr).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(%pr, error = %e, "code review failed, continuing");
            ReviewOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

async fn review<H>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    pr: PrNumber,
) -> Result<ReviewOutcome, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let details = fetch_pr(hosts, pr).await?;
    let files = fetch_files(hosts, pr).await?;
    let notes = files.iter().filter_map(text::file_note).count();

    let comment = GitHubEffect::CreateReview {
        pr,
        body: text::overview(&details, &files, &ctx.config.fork_owner),
        event: ReviewEvent::Comment,
    };
    expect_review(perform(hosts, Identity::Proposer, comment).await?)?;

    let approval = GitHubEffect::CreateReview {
        pr,
        body: text::approval(&ctx.config.repo.owner),
        event: ReviewEvent::Approve,
    };
    expect_review(perform(hosts, Identity::Approver, approval).await?)?;

    info!(%pr, files = files.len(), notes, "PR reviewed and approved");
    Ok(ReviewOutcome::Reviewed {
        files: files.len(),
        notes,
    })
}

async fn fetch_pr<H>(hosts: &Identities<H>, pr: PrNumber) -> Result<PrData, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    match perform(hosts, Identity::Proposer, GitHubEffect::GetPr { pr }).await? {
        GitHubResponse::Pr(data) => Ok(data),
        other => Err(GitHubApiError::unexpected_response("get_pr", other)),
    }
}

async fn fetch_files<H>(
    hosts: &Identities<H>,
    pr: PrNumber,
) -> Result<Vec<ChangedFile>, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    match perform(hosts, Identity::Proposer, GitHubEffect::ListPrFiles { pr }).await? {
        GitHubResponse::PrFiles(files) => Ok(files),
        other => Err(GitHubApiError::unexpected_response("list_pr_files", other)),
    }
}

fn expect_review(response: GitHubResponse) -> Result<(), GitHubApiError> {
    match response {
        GitHubResponse::ReviewCreated => Ok(()),
        other => Err(GitHubApiError::unexpected_response("create_review", other)),
    }
}
