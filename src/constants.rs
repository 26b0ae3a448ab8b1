//! Application-wide constants
//!
//! This module contains all constant values used throughout the worker.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// QUEUE DEFAULTS
// =============================================================================

/// Default Redis stream carrying inbound tasks
pub const DEFAULT_TASK_STREAM: &str = "proposal";

/// Default consumer group name
pub const DEFAULT_CONSUMER_GROUP: &str = "pushbench_workers";

/// Default XREADGROUP block timeout in milliseconds
pub const DEFAULT_BLOCK_TIMEOUT_MS: usize = 5000;

/// Field of a stream entry that carries the task JSON
pub const PAYLOAD_FIELD: &str = "payload";

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// HOSTING PLATFORM
// =============================================================================

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// API version header value sent with every GitHub request
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Commit-status descriptions beyond this length are truncated
pub const COMMIT_DESCRIPTION_LIMIT: usize = 140;

/// Lifetime of a GitHub App JWT in seconds
pub const APP_JWT_TTL_SECS: u64 = 540;

/// Backdate applied to App JWT issuance to absorb clock skew
pub const APP_JWT_SKEW_SECS: u64 = 60;

// =============================================================================
// STAGE TIMEOUT DEFAULTS (seconds)
// =============================================================================

/// Default timeout for a single git clone
pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 300;

/// Default timeout for the image build
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 900;

/// Default timeout for the full benchmark run
pub const DEFAULT_BENCH_TIMEOUT_SECS: u64 = 3600;

/// Default timeout for artifact extraction
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// BENCHMARK LEVELS
// =============================================================================

/// Default level passed to the harness for push-origin tasks
pub const DEFAULT_PUSH_LEVEL: &str = "1";

/// Default level passed to the harness for upgrade-origin tasks
pub const DEFAULT_UPGRADE_LEVEL: &str = "2";

// =============================================================================
// RESULT ARTIFACTS
// =============================================================================

/// Harness success/failure verdict artifact
pub const STATUS_ARTIFACT: &str = "status.json";

/// Raw timing-sample document emitted by the harness
pub const RAW_ARTIFACT: &str = "bench.json";

/// Directory inside the benchmark container holding result artifacts
pub const CONTAINER_OUTPUT_DIR: &str = "/usr/src/app/output";

/// Directory created under the working folder for extracted artifacts
pub const OUTPUT_DIR: &str = "output";

// =============================================================================
// STATISTICS
// =============================================================================

/// Microseconds per second, for sample conversion
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Tukey fence multiplier for outlier counting
pub const TUKEY_FENCE_MULTIPLIER: f64 = 1.5;

/// Timestamp format of a run's metadata date
pub const RUN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
