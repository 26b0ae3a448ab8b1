//! External process execution with bounded timeouts
//!
//! Clone, build, compose and copy steps all shell out to external tooling.
//! Every invocation runs under a timeout so a hung process cannot block the
//! worker's consume loop indefinitely.

use std::process::Output;
use std::time::Duration;

use tokio::process::Command;

use crate::error::WorkerError;

/// Captured output of a finished external command
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        }
    }
}

/// Failure to run a command at all (as opposed to the command exiting
/// non-zero, which callers judge from [`CommandOutput`])
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0} timed out after {1}s")]
    Timeout(&'static str, u64),

    #[error("failed to run {0}: {1}")]
    Spawn(&'static str, std::io::Error),
}

impl CommandError {
    /// Fold into the worker taxonomy: timeouts stay timeouts, spawn failures
    /// become the caller's stage error.
    pub fn into_stage_error(self, stage: fn(String) -> WorkerError) -> WorkerError {
        match self {
            Self::Timeout(label, secs) => WorkerError::Timeout(label, secs),
            Self::Spawn(label, err) => stage(format!("failed to run {label}: {err}")),
        }
    }
}

/// Run a command to completion, capturing output, bounded by `timeout`
pub async fn run_command(
    command: &mut Command,
    label: &'static str,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    command.kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| CommandError::Timeout(label, timeout.as_secs()))?
        .map_err(|e| CommandError::Spawn(label, e))?;

    Ok(output.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_exit() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; exit 0"]);
        let out = run_command(&mut cmd, "echo", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_success() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo oops >&2; exit 3"]);
        let out = run_command(&mut cmd, "sh", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_timeout_fires() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_command(&mut cmd, "sleep", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout("sleep", _)));
    }
}
