//! Worker configuration management
//!
//! Configuration is loaded from environment variables once at startup and
//! passed by value into every constructor; business logic never reads
//! ambient state.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BENCH_TIMEOUT_SECS, DEFAULT_BLOCK_TIMEOUT_MS, DEFAULT_BUILD_TIMEOUT_SECS,
    DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_CONSUMER_GROUP, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_EXTRACT_TIMEOUT_SECS, DEFAULT_GITHUB_API_BASE, DEFAULT_PUSH_LEVEL,
    DEFAULT_TASK_STREAM, DEFAULT_UPGRADE_LEVEL,
};

/// Main worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub worker: WorkerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub github: GitHubConfig,
    pub storage: StorageConfig,
    pub benchmark: BenchmarkConfig,
}

/// Worker identity
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name shown in commit-status descriptions and used as the consumer name
    pub name: String,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Task queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    pub stream: String,
    pub consumer_group: String,
    pub block_timeout_ms: usize,
}

/// Hosting-platform (GitHub App) configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub app_id: String,
    /// Base64-encoded PEM of the App's private key
    pub private_key_base64: String,
    /// Installation that owns the benchmarking harness repository
    pub harness_installation_id: i64,
    pub harness_owner: String,
    pub harness_repo: String,
}

/// Filesystem layout for working copies
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root under which per-submission working folders are created
    pub workspaces_path: PathBuf,
}

/// Benchmark execution configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Harness level for push-origin tasks
    pub push_level: String,
    /// Harness level for upgrade-origin tasks
    pub upgrade_level: String,
    pub clone_timeout_secs: u64,
    pub build_timeout_secs: u64,
    pub bench_timeout_secs: u64,
    pub extract_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            worker: WorkerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            github: GitHubConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            benchmark: BenchmarkConfig::from_env()?,
        })
    }
}

impl WorkerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            name: env::var("WORKER_NAME").unwrap_or_else(|_| "pushbench-worker".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DATABASE_MAX_CONNECTIONS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()))?,
        })
    }
}

impl QueueConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream: env::var("TASK_STREAM").unwrap_or_else(|_| DEFAULT_TASK_STREAM.to_string()),
            consumer_group: env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| DEFAULT_CONSUMER_GROUP.to_string()),
            block_timeout_ms: env::var("BLOCK_TIMEOUT_MS")
                .unwrap_or_else(|_| DEFAULT_BLOCK_TIMEOUT_MS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BLOCK_TIMEOUT_MS".to_string()))?,
        })
    }
}

impl GitHubConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: env::var("GITHUB_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GITHUB_API_BASE.to_string()),
            app_id: env::var("GITHUB_APP_ID")
                .map_err(|_| ConfigError::Missing("GITHUB_APP_ID".to_string()))?,
            private_key_base64: env::var("GITHUB_PRIVATE_KEY")
                .map_err(|_| ConfigError::Missing("GITHUB_PRIVATE_KEY".to_string()))?,
            harness_installation_id: env::var("HARNESS_INSTALLATION_ID")
                .map_err(|_| ConfigError::Missing("HARNESS_INSTALLATION_ID".to_string()))?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HARNESS_INSTALLATION_ID".to_string()))?,
            harness_owner: env::var("HARNESS_OWNER")
                .map_err(|_| ConfigError::Missing("HARNESS_OWNER".to_string()))?,
            harness_repo: env::var("HARNESS_REPO")
                .map_err(|_| ConfigError::Missing("HARNESS_REPO".to_string()))?,
        })
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            workspaces_path: PathBuf::from(
                env::var("WORKSPACES_PATH").unwrap_or_else(|_| "/data/workspaces".to_string()),
            ),
        })
    }
}

impl BenchmarkConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            push_level: env::var("TEST_LEVEL").unwrap_or_else(|_| DEFAULT_PUSH_LEVEL.to_string()),
            upgrade_level: env::var("UPGRADE_LEVEL")
                .unwrap_or_else(|_| DEFAULT_UPGRADE_LEVEL.to_string()),
            clone_timeout_secs: parse_or_default("CLONE_TIMEOUT_SECS", DEFAULT_CLONE_TIMEOUT_SECS)?,
            build_timeout_secs: parse_or_default("BUILD_TIMEOUT_SECS", DEFAULT_BUILD_TIMEOUT_SECS)?,
            bench_timeout_secs: parse_or_default("BENCH_TIMEOUT_SECS", DEFAULT_BENCH_TIMEOUT_SECS)?,
            extract_timeout_secs: parse_or_default(
                "EXTRACT_TIMEOUT_SECS",
                DEFAULT_EXTRACT_TIMEOUT_SECS,
            )?,
        })
    }
}

fn parse_or_default(var: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_uses_default_when_unset() {
        // Env var name chosen to never exist in a test environment
        let value = parse_or_default("PUSHBENCH_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
