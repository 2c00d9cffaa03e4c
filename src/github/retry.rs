//! Exponential backoff for transient GitHub API failures.
//!
//! Only `Transient` errors are retried. `NotFound` and `Permanent` errors are
//! returned on the first attempt, as is every error under
//! `RetryPolicy::NoRetry`.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::{GitHubApiError, GitHubErrorKind};

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Cap on the delay between retries.
    pub max_delay: Duration,

    /// Growth factor per attempt.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 3 retries with 2s, 4s, 8s delays.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        backoff_multiplier: 2.0,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Computes the delay for the given retry attempt (0-indexed):
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether a call may be retried at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry transient errors with exponential backoff.
    #[default]
    RetryTransient,

    /// Return the first error. Used for calls that create something, where a
    /// timed-out attempt may still have landed.
    NoRetry,
}

impl RetryPolicy {
    /// `RetryTransient` for idempotent calls, `NoRetry` otherwise.
    pub fn for_idempotent(idempotent: bool) -> Self {
        if idempotent {
            RetryPolicy::RetryTransient
        } else {
            RetryPolicy::NoRetry
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    /// The operation succeeded.
    Success(T),

    /// A transient error persisted through every allowed attempt.
    ExhaustedRetries {
        last_error: GitHubApiError,
        /// Attempts made, including the initial one.
        attempts: u32,
    },

    /// A non-retriable error.
    Failed(GitHubApiError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, GitHubApiError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::Failed(e) => Err(e),
        }
    }
}

/// Executes an async operation, retrying transient failures.
///
/// `label` names the operation in the retry log lines.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let max_attempts = match policy {
        RetryPolicy::NoRetry => 1,
        RetryPolicy::RetryTransient => config.max_retries + 1,
    };
    let mut attempt = 0;

    loop {
        let e = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => e,
        };
        attempt += 1;

        match e.kind {
            GitHubErrorKind::Permanent | GitHubErrorKind::NotFound => {
                return RetryResult::Failed(e);
            }
            GitHubErrorKind::Transient if attempt >= max_attempts => {
                return RetryResult::ExhaustedRetries {
                    last_error: e,
                    attempts: attempt,
                };
            }
            GitHubErrorKind::Transient => {
                let delay = config.delay_for_attempt(attempt - 1);
                warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient GitHub error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
