//! Runs the lifecycle phases in order.

use chrono::Utc;
use tracing::{error, info};

use crate::config::RunConfig;
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::Identities;

use super::access::validate_access;
use super::branch::{BranchSync, ensure_branch};
use super::commit::commit_change;
use super::gate::{ProbabilityGate, Sampler, ThreadRngSampler};
use super::issue::{IssueOutcome, maybe_open_issue};
use super::merge::merge;
use super::mergeability::await_mergeable;
use super::pull_request::{Discovered, find_or_create};
use super::report::{Phase, PhaseStatus, RunReport};
use super::review::{ReviewOutcome, SkipReason, maybe_review};
use super::{LifecycleError, RunContext};

/// Sequences one lifecycle run.
///
/// The configuration and both hosting clients are fixed at construction. A
/// run is forward-only: a fatal phase stops it, and nothing already done is
/// undone.
pub struct Orchestrator<H, S = ThreadRngSampler> {
    config: RunConfig,
    hosts: Identities<H>,
    gate: ProbabilityGate<S>,
}

impl<H> Orchestrator<H, ThreadRngSampler>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    pub fn new(config: RunConfig, hosts: Identities<H>) -> Self {
        Self::with_sampler(config, hosts, ThreadRngSampler)
    }
}

impl<H, S> Orchestrator<H, S>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
    S: Sampler,
{
    /// Uses `sampler` for the issue and review draws.
    pub fn with_sampler(config: RunConfig, hosts: Identities<H>, sampler: S) -> Self {
        let gate = ProbabilityGate::with_sampler(config.probability, sampler);
        Orchestrator {
            config,
            hosts,
            gate,
        }
    }

    /// Runs every phase and reports the outcome. Never fails: a fatal error
    /// is recorded in the report.
    pub async fn run(&self) -> RunReport {
        let mut report = self.new_report();
        match self.execute(&mut report).await {
            Ok(()) => {
                report.success = true;
                info!(pr = ?report.pr.map(|p| p.0), "run completed");
            }
            Err(e) => {
                error!(phase = ?e.phase(), error = %e, "run failed");
                report.record(e.phase(), PhaseStatus::Failed, e.to_string());
                report.remediation = e.remediation();
                report.error = Some(e.to_string());
            }
        }
        report
    }

    /// Like `run`, but returns the fatal error instead of recording it.
    pub async fn run_checked(&self) -> Result<RunReport, LifecycleError> {
        let mut report = self.new_report();
        self.execute(&mut report).await?;
        report.success = true;
        Ok(report)
    }

    fn new_report(&self) -> RunReport {
        RunReport::new(self.config.repo.to_string(), self.config.branch.clone())
    }

    async fn execute(&self, report: &mut RunReport) -> Result<(), LifecycleError> {
        let config = &self.config;
        info!(
            repo = %config.repo,
            proposer = %config.fork_owner,
            branch = %config.branch,
            create_issue = config.create_issue,
            code_review = config.enable_code_review,
            probability = %config.probability,
            "pull-merge bot starting"
        );

        let repository = validate_access(&self.hosts, &config.repo).await?;
        report.record(
            Phase::Access,
            PhaseStatus::Completed,
            format!("default branch {}", repository.default_branch),
        );
        let ctx = RunContext::new(config, repository.default_branch);

        match maybe_open_issue(&self.hosts, &ctx, &self.gate, Utc::now()).await {
            IssueOutcome::Created { number, url } => {
                report.issue = Some(number);
                report.record(Phase::Issue, PhaseStatus::Completed, url);
            }
            IssueOutcome::Skipped { reason } => {
                report.record(Phase::Issue, PhaseStatus::Skipped, skip_detail(reason));
            }
            IssueOutcome::Failed { reason } => {
                report.record(Phase::Issue, PhaseStatus::Degraded, reason);
            }
        }

        let synced = ensure_branch(&self.hosts, &ctx.default_branch, &config.branch).await?;
        let detail = match &synced {
            BranchSync::Created { head } => format!("created at {}", head.short()),
            BranchSync::Reset {
                previous_head,
                head,
            } => format!("reset from {} to {}", previous_head.short(), head.short()),
        };
        report.record(Phase::Branch, PhaseStatus::Completed, detail);

        let bundle = commit_change(
            &self.hosts,
            &ctx,
            &config.branch,
            &config.file_path,
            Utc::now(),
        )
        .await?;
        report.record(
            Phase::Commit,
            PhaseStatus::Completed,
            format!("{} on {}", bundle.commit.short(), bundle.parent.short()),
        );

        let discovered = find_or_create(&self.hosts, &ctx, &config.branch, Utc::now()).await?;
        let pr = discovered.pr().number;
        report.pr = Some(pr);
        report.pr_created = Some(discovered.was_created());
        report.record(
            Phase::PullRequest,
            PhaseStatus::Completed,
            match discovered {
                Discovered::Existing(_) => format!("using existing PR {pr}"),
                Discovered::Created(_) => format!("opened PR {pr}"),
            },
        );

        match maybe_review(&self.hosts, &ctx, &self.gate, pr).await {
            ReviewOutcome::Reviewed { files, notes } => report.record(
                Phase::Review,
                PhaseStatus::Completed,
                format!("{files} files, {notes} notes"),
            ),
            ReviewOutcome::Skipped { reason } => {
                report.record(Phase::Review, PhaseStatus::Skipped, skip_detail(reason))
            }
            ReviewOutcome::Failed { reason } => {
                report.record(Phase::Review, PhaseStatus::Degraded, reason)
            }
        }

        let polled = await_mergeable(&self.hosts.proposer, pr, &config.poll).await?;
        report.record(
            Phase::Mergeability,
            PhaseStatus::Completed,
            format!("mergeable after {} rechecks", polled.rechecks),
        );

        let merged = merge(&self.hosts, &ctx, pr).await?;
        report.merge_sha = Some(merged.sha.clone());
        report.record(
            Phase::Merge,
            PhaseStatus::Completed,
            format!("squashed into {} as {}", merged.base, merged.sha.short()),
        );
        if merged.notified {
            report.record(Phase::Notify, PhaseStatus::Completed, "completion comment posted");
        } else {
            report.record(
                Phase::Notify,
                PhaseStatus::Degraded,
                "completion comment not posted",
            );
        }

        Ok(())
    }
}

fn skip_detail(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Disabled => "disabled",
        SkipReason::NotTriggered => "not triggered",
    }
}
