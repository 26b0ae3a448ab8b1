//! Submission model
//!
//! A submission is the permanent audit record of one benchmark attempt for a
//! commit. It is created once per task and exclusively owned by the pipeline
//! processing that task until it reaches a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub commit_hash: String,
    pub status: String,
    pub description: Option<String>,
    /// Mean latency in microseconds, set on success
    pub runtime: Option<f64>,
    pub parsed_stats: Option<serde_json::Value>,
    pub raw_stats: Option<serde_json::Value>,
    pub is_upgrade: bool,
    pub created_at: DateTime<Utc>,
}

/// Submission lifecycle status
///
/// Transitions run strictly forward:
/// `Initializing → Cloning → Building → Benchmarking → Extracting` and end in
/// exactly one of `Success`, `Failure` (clean negative harness verdict) or
/// `Error` (infrastructure fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Initializing,
    Cloning,
    Building,
    Benchmarking,
    Extracting,
    Success,
    Failure,
    Error,
}

impl SubmissionStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Cloning => "cloning",
            Self::Building => "building",
            Self::Benchmarking => "benchmarking",
            Self::Extracting => "extracting",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initializing" => Some(Self::Initializing),
            "cloning" => Some(Self::Cloning),
            "building" => Some(Self::Building),
            "benchmarking" => Some(Self::Benchmarking),
            "extracting" => Some(Self::Extracting),
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if this is a terminal status (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Error)
    }

    /// The commit state mirrored to the hosting platform for this status
    pub fn commit_state(&self) -> CommitState {
        match self {
            Self::Success => CommitState::Success,
            Self::Failure => CommitState::Failure,
            Self::Error => CommitState::Error,
            _ => CommitState::Pending,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Commit state accepted by the hosting platform's status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SubmissionStatus::Initializing,
            SubmissionStatus::Cloning,
            SubmissionStatus::Building,
            SubmissionStatus::Benchmarking,
            SubmissionStatus::Extracting,
            SubmissionStatus::Success,
            SubmissionStatus::Failure,
            SubmissionStatus::Error,
        ] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::from_str("compiling"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SubmissionStatus::Success.is_terminal());
        assert!(SubmissionStatus::Failure.is_terminal());
        assert!(SubmissionStatus::Error.is_terminal());
        assert!(!SubmissionStatus::Benchmarking.is_terminal());
    }

    #[test]
    fn test_in_flight_statuses_report_pending() {
        assert_eq!(
            SubmissionStatus::Cloning.commit_state(),
            CommitState::Pending
        );
        assert_eq!(
            SubmissionStatus::Extracting.commit_state(),
            CommitState::Pending
        );
        assert_eq!(
            SubmissionStatus::Failure.commit_state(),
            CommitState::Failure
        );
        assert_eq!(SubmissionStatus::Error.commit_state(), CommitState::Error);
    }
}
