//! Benchmark result models

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Raw timing-sample document emitted by the benchmark harness.
///
/// The shape follows the pyperf JSON format: one or more benchmarks, each a
/// sequence of runs where the first run is calibration and carries no values
/// used for statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBenchmarkDocument {
    pub benchmarks: Vec<RawBenchmark>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBenchmark {
    pub runs: Vec<RawRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRun {
    pub metadata: RunMetadata,
    /// Raw timing samples in seconds
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run start timestamp, `YYYY-MM-DD HH:MM:SS.mmm`
    pub date: String,
}

/// Descriptive statistics derived from a raw benchmark document.
///
/// Immutable once computed. All sample-derived values are in microseconds
/// except `raw_min`/`raw_max` (milliseconds) and `total_duration` (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStats {
    pub total_duration: f64,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub raw_min: f64,
    pub raw_max: f64,
    pub calibration_runs: u32,
    pub value_runs: u32,
    pub total_runs: u32,
    pub warmups_per_run: u32,
    pub values_per_run: u32,
    pub loop_iterations: u32,
    pub total_values: u32,
    pub minimum: f64,
    pub median: f64,
    pub mad: f64,
    pub mean: f64,
    pub stddev: f64,
    pub maximum: f64,
    /// Keyed `"0th"`, `"5th"`, `"25th"`, `"50th"`, `"75th"`, `"95th"`, `"100th"`
    pub percentiles: HashMap<String, f64>,
    pub outliers: usize,
}
