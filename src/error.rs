//! Custom error types and handling
//!
//! This module defines the worker's error taxonomy. Every fault raised inside
//! the pipeline is one of these variants; the processor maps them onto the
//! submission's terminal status at the task boundary.

/// Worker-wide error type
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    // Task intake errors
    #[error("Malformed task: {0}")]
    MalformedTask(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Storage errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Pipeline stage errors
    #[error("Clone failed: {0}")]
    Clone(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Benchmark run failed: {0}")]
    Runtime(String),

    #[error("Result extraction failed: {0}")]
    Extraction(String),

    /// The submitted program ran, but the harness reported it did not meet
    /// its correctness criteria. Maps to `Failure`, not `Error`.
    #[error("Benchmark failed: {0}")]
    HarnessFailure(String),

    // Status mirroring errors
    #[error("Reporting failed: {0}")]
    Reporting(String),

    #[error("{0} timed out after {1}s")]
    Timeout(&'static str, u64),
}

impl WorkerError {
    /// Short machine-readable code for operator logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTask(_) => "MALFORMED_TASK",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Clone(_) => "CLONE_ERROR",
            Self::Build(_) => "BUILD_ERROR",
            Self::Runtime(_) => "RUNTIME_ERROR",
            Self::Extraction(_) => "EXTRACTION_ERROR",
            Self::HarnessFailure(_) => "HARNESS_FAILURE",
            Self::Reporting(_) => "REPORTING_ERROR",
            Self::Timeout(_, _) => "TIMEOUT",
        }
    }
}

// Implement From for common error types
impl From<sqlx::Error> for WorkerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => WorkerError::NotFound("row not found".to_string()),
            _ => WorkerError::Persistence(err.to_string()),
        }
    }
}

impl From<bollard::errors::Error> for WorkerError {
    fn from(err: bollard::errors::Error) -> Self {
        WorkerError::Runtime(err.to_string())
    }
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Reporting(err.to_string())
    }
}

/// Result type alias using WorkerError
pub type WorkerResult<T> = Result<T, WorkerError>;
