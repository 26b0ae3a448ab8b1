//! Container lifecycle orchestration
//!
//! Wraps the external build/run tooling for one submission: image build,
//! compose-managed benchmark execution, log streaming, exit-code inspection,
//! artifact extraction and teardown. The compose CLI, image build and
//! artifact copy run as external processes; container queries go through the
//! engine API.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptionsBuilder, LogsOptionsBuilder,
    RemoveContainerOptionsBuilder, RemoveImageOptionsBuilder,
};
use futures::StreamExt;
use tokio::process::Command;

use crate::config::BenchmarkConfig;
use crate::constants::{CONTAINER_OUTPUT_DIR, OUTPUT_DIR};
use crate::error::{WorkerError, WorkerResult};
use crate::utils::process::run_command;

/// Docker orchestration for benchmark runs
pub struct DockerService {
    docker: Docker,
    build_timeout: Duration,
    bench_timeout: Duration,
    extract_timeout: Duration,
}

impl DockerService {
    /// Create a new orchestrator over an engine handle
    pub fn new(docker: Docker, config: &BenchmarkConfig) -> Self {
        Self {
            docker,
            build_timeout: Duration::from_secs(config.build_timeout_secs),
            bench_timeout: Duration::from_secs(config.bench_timeout_secs),
            extract_timeout: Duration::from_secs(config.extract_timeout_secs),
        }
    }

    /// Build the submission image from the working folder's Dockerfile
    pub async fn build_image(&self, name: &str, path: &Path) -> WorkerResult<()> {
        tracing::info!(image = %name, "starting image build");

        let mut cmd = Command::new("docker");
        cmd.args(["build", "-t", name, "."]).current_dir(path);

        let output = run_command(&mut cmd, "docker build", self.build_timeout)
            .await
            .map_err(|e| e.into_stage_error(WorkerError::Build))?;

        if !output.success {
            return Err(WorkerError::Build(output.stderr));
        }

        tracing::info!(image = %name, "image build completed");
        Ok(())
    }

    /// Start the compose stack detached and follow it to completion.
    ///
    /// A container that never reaches a running state surfaces its logs in
    /// the error; a non-zero exit code after the run fails the stage.
    pub async fn run_benchmarks(&self, name: &str, path: &Path, level: &str) -> WorkerResult<()> {
        let mut cmd = Command::new("docker-compose");
        cmd.args(["up", "-d"])
            .current_dir(path)
            .env("LEVEL", level)
            .env("CONTAINER_NAME", name);

        let output = run_command(&mut cmd, "docker-compose up", self.bench_timeout)
            .await
            .map_err(|e| e.into_stage_error(WorkerError::Runtime))?;
        if !output.success {
            return Err(WorkerError::Runtime(output.stderr));
        }

        let Some(running) = self.find_container(name, false).await? else {
            let logs = match self.find_container(name, true).await? {
                Some(id) => self.collect_logs(&id).await,
                None => String::new(),
            };
            return Err(WorkerError::Runtime(format!(
                "container failed to start or exited immediately; logs: {logs}"
            )));
        };

        tokio::time::timeout(self.bench_timeout, self.stream_logs(&running))
            .await
            .map_err(|_| WorkerError::Timeout("benchmark run", self.bench_timeout.as_secs()))?;

        // The compose-managed container may already be gone; fall back to the
        // most recent container carrying the submission name.
        let Some(id) = self.find_container(name, true).await? else {
            tracing::warn!(container = %name, "no container left to inspect, assuming success");
            return Ok(());
        };

        let exit_code = self.exit_code(&id).await?;
        if exit_code != 0 {
            return Err(WorkerError::Runtime(format!(
                "benchmark exited with code {exit_code}"
            )));
        }

        tracing::info!(container = %name, "benchmark execution completed");
        Ok(())
    }

    /// Copy result artifacts out of the container into `<path>/output/`
    pub async fn copy_output(&self, name: &str, path: &Path) -> WorkerResult<PathBuf> {
        let output_path = path.join(OUTPUT_DIR);
        tokio::fs::create_dir_all(&output_path)
            .await
            .map_err(|e| WorkerError::Extraction(format!("failed to create output dir: {e}")))?;

        let id = self
            .find_container(name, true)
            .await
            .map_err(|e| match e {
                WorkerError::Runtime(msg) => WorkerError::Extraction(msg),
                other => other,
            })?
            .ok_or_else(|| {
                WorkerError::Extraction("unable to find container to copy from".to_string())
            })?;

        let source = format!("{id}:{CONTAINER_OUTPUT_DIR}/.");
        let mut cmd = Command::new("docker");
        cmd.arg("cp").arg(&source).arg(&output_path);

        let output = run_command(&mut cmd, "docker cp", self.extract_timeout)
            .await
            .map_err(|e| e.into_stage_error(WorkerError::Extraction))?;
        if !output.success {
            return Err(WorkerError::Extraction(output.stderr));
        }

        tracing::info!(container = %id, path = %output_path.display(), "artifacts copied");
        Ok(output_path)
    }

    /// Best-effort teardown of the container and its image. Runs on every
    /// exit path; failures are logged, never raised.
    pub async fn cleanup(&self, name: &str) {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();
        if let Err(e) = self.docker.remove_container(name, Some(options)).await {
            tracing::warn!(container = %name, error = %e, "container removal failed");
        }

        let options = RemoveImageOptionsBuilder::default().force(true).build();
        if let Err(e) = self.docker.remove_image(name, Some(options), None).await {
            tracing::warn!(image = %name, error = %e, "image removal failed");
        }
    }

    /// Most recent container whose name matches, optionally including exited
    /// containers
    async fn find_container(&self, name: &str, all: bool) -> WorkerResult<Option<String>> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![name.to_string()]);
        if !all {
            filters.insert("status".to_string(), vec!["running".to_string()]);
        }

        let options = ListContainersOptionsBuilder::default()
            .all(all)
            .filters(&filters)
            .build();

        let containers = self.docker.list_containers(Some(options)).await?;
        let newest = containers
            .into_iter()
            .max_by_key(|container| container.created.unwrap_or(0));

        Ok(newest.and_then(|container| container.id))
    }

    /// Follow a container's log stream into the operator log until it exits
    async fn stream_logs(&self, id: &str) {
        let options = LogsOptionsBuilder::default()
            .follow(true)
            .stdout(true)
            .stderr(true)
            .build();

        let mut stream = self.docker.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) => {
                    tracing::info!(target: "benchmark", "{}", String::from_utf8_lossy(&message).trim_end());
                }
                Ok(LogOutput::StdErr { message }) => {
                    tracing::warn!(target: "benchmark", "{}", String::from_utf8_lossy(&message).trim_end());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(container = %id, error = %e, "log stream interrupted");
                    break;
                }
            }
        }
    }

    /// Recent log tail of a container, best effort
    async fn collect_logs(&self, id: &str) -> String {
        let options = LogsOptionsBuilder::default()
            .stdout(true)
            .stderr(true)
            .tail("100")
            .build();

        let mut logs = String::new();
        let mut stream = self.docker.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => logs.push_str(&String::from_utf8_lossy(&output.into_bytes())),
                Err(_) => break,
            }
        }

        logs
    }

    /// Exit code of a finished container
    async fn exit_code(&self, id: &str) -> WorkerResult<i64> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;

        Ok(inspect.state.and_then(|s| s.exit_code).unwrap_or(0))
    }
}
