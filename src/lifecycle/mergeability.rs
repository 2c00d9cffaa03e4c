//! Mergeability convergence polling.
//!
//! GitHub reports `mergeable` as `null` until it has test-merged the PR in
//! the background. The poller waits out the unknown state on a fixed
//! interval, bounded by `PollConfig::max_rechecks`.
//!
//! ```text
//!   sleep(initial_delay)
//!        │
//!        ▼
//!   ┌─ read PR ──► Yes ──► Ok
//!   │     │
//!   │     ├──────► No ───► MergeConflict
//!   │     │
//!   │     ▼
//!   │  Unknown ──(rechecks == max)──► MergeabilityExhausted
//!   │     │
//!   └─ sleep(recheck_interval)
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::config::PollConfig;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{Mergeable, PrNumber};

use super::LifecycleError;

/// How a successful poll went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    /// Reads after the first one.
    pub rechecks: u32,
}

/// Polls `pr` until GitHub decides its mergeability.
///
/// `host` should act as the Proposer.
pub async fn await_mergeable<H>(
    host: &H,
    pr: PrNumber,
    poll: &PollConfig,
) -> Result<PollOutcome, LifecycleError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    tokio::time::sleep(poll.initial_delay).await;

    let mut rechecks = 0u32;
    loop {
        let state = read_mergeable(host, pr)
            .await
            .map_err(|source| LifecycleError::MergeabilityCheck { pr, source })?;

        match state {
            Mergeable::Yes => {
                info!(%pr, rechecks, "PR is mergeable");
                return Ok(PollOutcome { rechecks });
            }
            Mergeable::No => return Err(LifecycleError::MergeConflict { pr }),
            Mergeable::Unknown if rechecks >= poll.max_rechecks => {
                return Err(LifecycleError::MergeabilityExhausted { pr, rechecks });
            }
            Mergeable::Unknown => {
                rechecks += 1;
                debug!(%pr, rechecks, "mergeability still being computed");
                tokio::time::sleep(poll.recheck_interval).await;
            }
        }
    }
}

async fn read_mergeable<H>(host: &H, pr: PrNumber) -> Result<Mergeable, GitHubApiError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    match host.interpret(GitHubEffect::GetPr { pr }).await? {
        GitHubResponse::Pr(data) => Ok(data.mergeable),
        other => Err(GitHubApiError::unexpected_response("get_pr", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeGitHub;
    use proptest::prelude::*;
    use std::time::Duration;

    use Mergeable::{No, Unknown, Yes};

    async fn poll_script(
        script: &[Mergeable],
        max_rechecks: u32,
    ) -> (Result<PollOutcome, LifecycleError>, usize) {
        let hosts = FakeGitHub::pair();
        let pr = hosts.proposer.open_pr("jonny", "main");
        hosts.proposer.script_mergeable(script.iter().copied());

        let result = await_mergeable(&hosts.proposer, pr, &PollConfig::immediate(max_rechecks)).await;
        (result, hosts.proposer.count("get_pr"))
    }

    #[tokio::test]
    async fn converges_after_two_rechecks() {
        let (result, reads) = poll_script(&[Unknown, Unknown, Yes], 5).await;
        assert_eq!(result.unwrap(), PollOutcome { rechecks: 2 });
        assert_eq!(reads, 3);
    }

    #[tokio::test]
    async fn conflict_fails_without_rechecking() {
        let (result, reads) = poll_script(&[No], 5).await;
        assert!(matches!(result, Err(LifecycleError::MergeConflict { .. })));
        assert_eq!(reads, 1);
    }

    #[tokio::test]
    async fn unknown_forever_is_bounded() {
        let (result, reads) = poll_script(&[Unknown], 4).await;
        assert!(matches!(
            result,
            Err(LifecycleError::MergeabilityExhausted { rechecks: 4, .. })
        ));
        assert_eq!(reads, 5);
    }

    #[tokio::test]
    async fn read_failure_is_fatal() {
        let hosts = FakeGitHub::pair();
        let pr = hosts.proposer.open_pr("jonny", "main");
        hosts.proposer.fail("get_pr");

        let result = await_mergeable(&hosts.proposer, pr, &PollConfig::immediate(3)).await;

        assert!(matches!(result, Err(LifecycleError::MergeabilityCheck { .. })));
        assert_eq!(hosts.proposer.count("get_pr"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_initial_delay_and_interval() {
        let hosts = FakeGitHub::pair();
        let pr = hosts.proposer.open_pr("jonny", "main");
        hosts.proposer.script_mergeable([Unknown, Yes]);
        let poll = PollConfig::new();

        let started = tokio::time::Instant::now();
        await_mergeable(&hosts.proposer, pr, &poll).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn reads_never_exceed_bound(unknowns in 0usize..30, max_rechecks in 0u32..10) {
            let mut script = vec![Unknown; unknowns];
            script.push(Yes);

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let (result, reads) = rt.block_on(poll_script(&script, max_rechecks));

            prop_assert!(reads <= max_rechecks as usize + 1);
            prop_assert_eq!(result.is_ok(), unknowns <= max_rechecks as usize);
        }
    }
}
