//! Machine-readable run outcome.

use serde::Serialize;

use crate::types::{IssueNumber, PrNumber, Sha};

/// Lifecycle phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Access,
    Issue,
    Branch,
    Commit,
    PullRequest,
    Review,
    Mergeability,
    Merge,
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Skipped,
    /// Failed without ending the run.
    Degraded,
    /// Failed and ended the run.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub detail: String,
}

/// What one run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub repository: String,
    pub branch: String,
    pub phases: Vec<PhaseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr: Option<PrNumber>,
    /// Whether this run opened the PR (as opposed to reusing an open one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_sha: Option<Sha>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl RunReport {
    pub fn new(repository: impl Into<String>, branch: impl Into<String>) -> Self {
        RunReport {
            repository: repository.into(),
            branch: branch.into(),
            ..RunReport::default()
        }
    }

    pub fn record(&mut self, phase: Phase, status: PhaseStatus, detail: impl Into<String>) {
        self.phases.push(PhaseRecord {
            phase,
            status,
            detail: detail.into(),
        });
    }

    /// The recorded status of a phase, if it ran.
    pub fn status_of(&self, phase: Phase) -> Option<PhaseStatus> {
        self.phases
            .iter()
            .rev()
            .find(|r| r.phase == phase)
            .map(|r| r.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_omits_absent_fields() {
        let mut report = RunReport::new("o/r", "jonny");
        report.record(Phase::Access, PhaseStatus::Completed, "ok");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["phases"][0]["phase"], "access");
        assert_eq!(json["phases"][0]["status"], "completed");
        assert!(json.get("pr").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn status_of_returns_latest_record() {
        let mut report = RunReport::new("o/r", "jonny");
        assert_eq!(report.status_of(Phase::Review), None);
        report.record(Phase::Review, PhaseStatus::Skipped, "disabled");
        assert_eq!(report.status_of(Phase::Review), Some(PhaseStatus::Skipped));
    }
}
