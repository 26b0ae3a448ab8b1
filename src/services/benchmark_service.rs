//! Benchmark result extraction
//!
//! Reads the artifacts copied out of the benchmark container: the harness
//! verdict gates the run (a clean negative is `Failure`, not `Error`), then
//! the raw timing document is fed through the statistics engine.

use std::path::Path;

use serde::Deserialize;

use crate::benchmark::stats;
use crate::constants::{RAW_ARTIFACT, STATUS_ARTIFACT};
use crate::error::{WorkerError, WorkerResult};
use crate::models::{BenchmarkStats, RawBenchmarkDocument};

/// Verdict document written by the harness
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessStatus {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Extracted benchmark outcome: computed statistics plus the raw document
/// preserved for audit
#[derive(Debug, Clone)]
pub struct BenchmarkResults {
    pub parsed: BenchmarkStats,
    pub raw: serde_json::Value,
}

/// Extraction of benchmark results from the output directory
pub struct BenchmarkService;

impl BenchmarkService {
    /// Read the status and raw-stats artifacts and compute statistics
    pub async fn extract_results(output_path: &Path) -> WorkerResult<BenchmarkResults> {
        let status_text = tokio::fs::read_to_string(output_path.join(STATUS_ARTIFACT))
            .await
            .map_err(|e| WorkerError::Extraction(format!("{STATUS_ARTIFACT} not found: {e}")))?;
        let status: HarnessStatus = serde_json::from_str(&status_text)
            .map_err(|e| WorkerError::Extraction(format!("unparseable {STATUS_ARTIFACT}: {e}")))?;

        if !status.success {
            return Err(WorkerError::HarnessFailure(status.message));
        }

        let raw_text = tokio::fs::read_to_string(output_path.join(RAW_ARTIFACT))
            .await
            .map_err(|e| WorkerError::Extraction(format!("{RAW_ARTIFACT} not found: {e}")))?;
        let raw: serde_json::Value = serde_json::from_str(&raw_text)
            .map_err(|e| WorkerError::Extraction(format!("unparseable {RAW_ARTIFACT}: {e}")))?;

        let document: RawBenchmarkDocument = serde_json::from_value(raw.clone())
            .map_err(|e| WorkerError::Extraction(format!("unexpected {RAW_ARTIFACT} shape: {e}")))?;
        let parsed = stats::analyze(&document).map_err(|e| WorkerError::Extraction(e.to_string()))?;

        Ok(BenchmarkResults { parsed, raw })
    }

    /// Human-readable runtime for commit-status descriptions, mean latency
    /// floored to three decimal places of milliseconds
    pub fn format_runtime_description(mean_us: f64) -> String {
        let ms = (mean_us / 1000.0 * 1000.0).floor() / 1000.0;
        format!("Runtime: {ms} ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_DOCUMENT: &str = r#"{
        "benchmarks": [{
            "runs": [
                { "metadata": { "date": "2025-03-01 10:00:00.000" }, "values": [9.0] },
                { "metadata": { "date": "2025-03-01 10:00:10.000" }, "values": [10.0, 12.0] },
                { "metadata": { "date": "2025-03-01 10:00:30.000" }, "values": [11.0, 13.0] }
            ]
        }]
    }"#;

    async fn write_artifacts(dir: &Path, status: &str, bench: Option<&str>) {
        tokio::fs::write(dir.join(STATUS_ARTIFACT), status)
            .await
            .unwrap();
        if let Some(bench) = bench {
            tokio::fs::write(dir.join(RAW_ARTIFACT), bench).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_successful_extraction() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(
            dir.path(),
            r#"{"success": true, "message": "ok"}"#,
            Some(RAW_DOCUMENT),
        )
        .await;

        let results = BenchmarkService::extract_results(dir.path()).await.unwrap();
        assert_eq!(results.parsed.total_values, 4);
        assert!((results.parsed.median - 11_500_000.0).abs() < 1e-9);
        // The raw document is preserved verbatim for audit
        assert!(results.raw.get("benchmarks").is_some());
    }

    #[tokio::test]
    async fn test_harness_failure_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(
            dir.path(),
            r#"{"success": false, "message": "X"}"#,
            Some(RAW_DOCUMENT),
        )
        .await;

        let err = BenchmarkService::extract_results(dir.path())
            .await
            .unwrap_err();
        match err {
            WorkerError::HarnessFailure(message) => assert!(message.contains('X')),
            other => panic!("expected HarnessFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_status_artifact() {
        let dir = tempfile::tempdir().unwrap();

        let err = BenchmarkService::extract_results(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_unparseable_stats_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(
            dir.path(),
            r#"{"success": true, "message": "ok"}"#,
            Some("not json at all"),
        )
        .await;

        let err = BenchmarkService::extract_results(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Extraction(_)));
    }

    #[test]
    fn test_runtime_description_floors_to_micros() {
        assert_eq!(
            BenchmarkService::format_runtime_description(11_500_000.0),
            "Runtime: 11500 ms"
        );
        assert_eq!(
            BenchmarkService::format_runtime_description(12_345.678),
            "Runtime: 12.345 ms"
        );
    }
}
