//! Optional issue creation.
//!
//! The issue is independent of the PR and is opened as the Proposer. It is
//! best-effort: a failure is recorded and the run continues.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::content::issue as text;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{Identities, Identity, IssueNumber};

use super::gate::{ProbabilityGate, Sampler};
use super::review::SkipReason;
use super::{RunContext, perform};

/// What the issue step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    Skipped { reason: SkipReason },
    Created { number: IssueNumber, url: String },
    Failed { reason: String },
}

/// Draws once and, if the draw fires, opens an issue.
pub async fn maybe_open_issue<H, S>(
    hosts: &Identities<H>,
    ctx: &RunContext<'_>,
    gate: &ProbabilityGate<S>,
    at: DateTime<Utc>,
) -> IssueOutcome
where
    H: GitHubInterpreter<Error = GitHubApiError>,
    S: Sampler,
{
    if !ctx.config.create_issue {
        return IssueOutcome::Skipped {
            reason: SkipReason::Disabled,
        };
    }
    if !gate.draw() {
        info!(probability = %gate.probability(), "issue creation not triggered");
        return IssueOutcome::Skipped {
            reason: SkipReason::NotTriggered,
        };
    }

    let settings = &ctx.config.issue;
    let effect = GitHubEffect::CreateIssue {
        title: text::title(settings, at),
        body: text::body(settings, ctx.byline(), at),
        labels: text::labels(settings.kind),
    };
    match perform(hosts, Identity::Proposer, effect).await {
        Ok(GitHubResponse::IssueCreated { number, url }) => {
            info!(issue = %number, %url, "issue created");
            IssueOutcome::Created { number, url }
        }
        Ok(other) => failed(GitHubApiError::unexpected_response("create_issue", other)),
        Err(e) => failed(e),
    }
}

fn failed(e: GitHubApiError) -> IssueOutcome {
    warn!(error = %e, "issue creation failed, continuing");
    IssueOutcome::Failed {
        reason: e.to_string(),
    }
}
