//! Polling bounds for the mergeability check.
//!
//! GitHub computes a PR's mergeability lazily: the first read after a push
//! usually reports `null`. The poller waits once up front, then rechecks on a
//! fixed interval up to a bounded number of times.
//!
//! - **Initial delay**: 2 seconds
//! - **Recheck interval**: 3 seconds
//! - **Max rechecks**: 20 (about one minute), configurable via `--max-rechecks`

use std::time::Duration;

/// Default wait before the first mergeability read.
const DEFAULT_INITIAL_DELAY_SECS: u64 = 2;

/// Default wait between rechecks while the verdict is unknown.
const DEFAULT_RECHECK_INTERVAL_SECS: u64 = 3;

/// Default bound on rechecks.
const DEFAULT_MAX_RECHECKS: u32 = 20;

/// Configuration for mergeability polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first read.
    pub initial_delay: Duration,

    /// Wait between rechecks.
    pub recheck_interval: Duration,

    /// Rechecks allowed after the first read. The poller makes at most
    /// `max_rechecks + 1` reads.
    pub max_rechecks: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    pub fn new() -> Self {
        PollConfig {
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECS),
            recheck_interval: Duration::from_secs(DEFAULT_RECHECK_INTERVAL_SECS),
            max_rechecks: DEFAULT_MAX_RECHECKS,
        }
    }

    /// No waiting at all. For tests.
    pub fn immediate(max_rechecks: u32) -> Self {
        PollConfig {
            initial_delay: Duration::ZERO,
            recheck_interval: Duration::ZERO,
            max_rechecks,
        }
    }

    /// Upper bound on the time spent sleeping before giving up.
    pub fn max_wait(&self) -> Duration {
        self.initial_delay + self.recheck_interval * self.max_rechecks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PollConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(2));
        assert_eq!(config.recheck_interval, Duration::from_secs(3));
        assert_eq!(config.max_rechecks, 20);
    }

    #[test]
    fn max_wait_is_bounded() {
        assert_eq!(PollConfig::default().max_wait(), Duration::from_secs(62));
        assert_eq!(PollConfig::immediate(50).max_wait(), Duration::ZERO);
    }
}
