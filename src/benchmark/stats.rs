//! Descriptive statistics over raw timing samples
//!
//! The first run of a document is calibration and contributes no samples;
//! every later run's values are concatenated and converted to microseconds
//! before analysis.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::constants::{MICROS_PER_SECOND, RUN_DATE_FORMAT, TUKEY_FENCE_MULTIPLIER};
use crate::models::{BenchmarkStats, RawBenchmarkDocument};

/// Labels and fractions of the reported percentile map
const PERCENTILE_POINTS: [(&str, f64); 7] = [
    ("0th", 0.0),
    ("5th", 0.05),
    ("25th", 0.25),
    ("50th", 0.5),
    ("75th", 0.75),
    ("95th", 0.95),
    ("100th", 1.0),
];

/// Warm-up iterations the harness performs per run
const WARMUPS_PER_RUN: u32 = 1;

/// Inner-loop iterations per timed sample in the harness
const LOOP_ITERATIONS: u32 = 128;

/// Statistics engine faults
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("document contains no benchmarks")]
    NoBenchmarks,

    #[error("benchmark contains no runs")]
    NoRuns,

    #[error("no timing samples outside the calibration run")]
    EmptySamples,

    #[error("sample standard deviation requires more than {0} value(s)")]
    InsufficientSamples(usize),

    #[error("unparseable run timestamp: {0}")]
    BadTimestamp(String),
}

/// Compute the full statistics record for a raw benchmark document
pub fn analyze(document: &RawBenchmarkDocument) -> Result<BenchmarkStats, StatsError> {
    let benchmark = document.benchmarks.first().ok_or(StatsError::NoBenchmarks)?;
    let runs = &benchmark.runs;
    let first_run = runs.first().ok_or(StatsError::NoRuns)?;
    let last_run = runs.last().ok_or(StatsError::NoRuns)?;

    // Samples in seconds, calibration run excluded
    let raw_values: Vec<f64> = runs
        .iter()
        .skip(1)
        .flat_map(|run| run.values.iter().copied())
        .collect();
    if raw_values.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    let values_us: Vec<f64> = raw_values.iter().map(|v| v * MICROS_PER_SECOND).collect();

    let start_date = parse_run_date(&first_run.metadata.date)?;
    let end_date = parse_run_date(&last_run.metadata.date)?;
    let total_duration = (end_date - start_date).num_milliseconds() as f64 / 1000.0;

    let median_value = median(&values_us)?;
    let deviations: Vec<f64> = values_us.iter().map(|x| (x - median_value).abs()).collect();
    let mad = median(&deviations)?;
    let mean_value = mean(&values_us)?;
    let stddev_value = stddev(&values_us)?;

    let mut percentiles = HashMap::new();
    for (label, p) in PERCENTILE_POINTS {
        percentiles.insert(label.to_string(), percentile(&values_us, p)?);
    }

    let outliers = count_outliers(&values_us, TUKEY_FENCE_MULTIPLIER)?;

    Ok(BenchmarkStats {
        total_duration,
        start_date,
        end_date,
        raw_min: fold_min(&raw_values) * 1000.0,
        raw_max: fold_max(&raw_values) * 1000.0,
        calibration_runs: 1,
        value_runs: (runs.len() - 1) as u32,
        total_runs: runs.len() as u32,
        warmups_per_run: WARMUPS_PER_RUN,
        values_per_run: runs.get(1).map(|r| r.values.len() as u32).unwrap_or(0),
        loop_iterations: LOOP_ITERATIONS,
        total_values: values_us.len() as u32,
        minimum: fold_min(&values_us),
        median: median_value,
        mad,
        mean: mean_value,
        stddev: stddev_value,
        maximum: fold_max(&values_us),
        percentiles,
        outliers,
    })
}

/// Median of a sample set; average of the two middle elements when even
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;

    Ok(if sorted.len() % 2 != 0 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    })
}

/// Linearly interpolated percentile, `p` in `[0, 1]`
pub fn percentile(values: &[f64], p: f64) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    let sorted = sorted_copy(values);
    let pos = (sorted.len() - 1) as f64 * p;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;

    if base + 1 >= sorted.len() {
        return Ok(sorted[base]);
    }

    Ok(sorted[base] + rest * (sorted[base + 1] - sorted[base]))
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (divisor n-1); undefined for n <= 1
pub fn stddev(values: &[f64]) -> Result<f64, StatsError> {
    if values.len() <= 1 {
        return Err(StatsError::InsufficientSamples(values.len()));
    }

    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Count values outside the Tukey fence `[Q1 - k*IQR, Q3 + k*IQR]`
pub fn count_outliers(values: &[f64], multiplier: f64) -> Result<usize, StatsError> {
    let q1 = percentile(values, 0.25)?;
    let q3 = percentile(values, 0.75)?;
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    Ok(values.iter().filter(|&&v| v < lower || v > upper).count())
}

fn parse_run_date(date: &str) -> Result<NaiveDateTime, StatsError> {
    NaiveDateTime::parse_from_str(date, RUN_DATE_FORMAT)
        .map_err(|_| StatsError::BadTimestamp(date.to_string()))
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    sorted
}

fn fold_min(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::INFINITY, f64::min)
}

fn fold_max(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawBenchmark, RawRun, RunMetadata};

    const EPSILON: f64 = 1e-9;

    fn run(date: &str, values: Vec<f64>) -> RawRun {
        RawRun {
            metadata: RunMetadata {
                date: date.to_string(),
            },
            values,
        }
    }

    fn sample_document() -> RawBenchmarkDocument {
        RawBenchmarkDocument {
            benchmarks: vec![RawBenchmark {
                runs: vec![
                    run("2025-03-01 10:00:00.000", vec![9.0]),
                    run("2025-03-01 10:00:10.000", vec![10.0, 12.0]),
                    run("2025-03-01 10:00:30.000", vec![11.0, 13.0]),
                ],
            }],
        }
    }

    #[test]
    fn test_median_agrees_with_middle_percentile() {
        let samples = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let m = median(&samples).unwrap();
        let p50 = percentile(&samples, 0.5).unwrap();
        assert!((m - p50).abs() < EPSILON);
    }

    #[test]
    fn test_percentile_extremes_are_min_and_max() {
        let samples = vec![7.0, 2.0, 5.0, 11.0, 3.0];
        assert!((percentile(&samples, 0.0).unwrap() - 2.0).abs() < EPSILON);
        assert!((percentile(&samples, 1.0).unwrap() - 11.0).abs() < EPSILON);
    }

    #[test]
    fn test_percentile_interpolates() {
        let samples = vec![10.0, 20.0];
        assert!((percentile(&samples, 0.5).unwrap() - 15.0).abs() < EPSILON);
    }

    #[test]
    fn test_empty_samples_raise() {
        assert!(matches!(median(&[]), Err(StatsError::EmptySamples)));
        assert!(matches!(percentile(&[], 0.5), Err(StatsError::EmptySamples)));
        assert!(matches!(mean(&[]), Err(StatsError::EmptySamples)));
    }

    #[test]
    fn test_stddev_undefined_below_two_samples() {
        assert!(matches!(
            stddev(&[]),
            Err(StatsError::InsufficientSamples(0))
        ));
        assert!(matches!(
            stddev(&[5.0]),
            Err(StatsError::InsufficientSamples(1))
        ));
    }

    #[test]
    fn test_stddev_known_value() {
        // Samples 2, 4, 4, 4, 5, 5, 7, 9 have sample variance 32/7
        let samples = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((stddev(&samples).unwrap() - expected).abs() < EPSILON);
    }

    #[test]
    fn test_outlier_count_grows_as_fence_tightens() {
        let samples = vec![10.0, 11.0, 10.5, 10.2, 11.1, 10.8, 30.0, 55.0];
        let mut previous = 0;
        for multiplier in [3.0, 1.5, 0.5, 0.1] {
            let count = count_outliers(&samples, multiplier).unwrap();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn test_analyze_end_to_end() {
        let stats = analyze(&sample_document()).unwrap();

        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.value_runs, 2);
        assert_eq!(stats.total_values, 4);
        assert_eq!(stats.values_per_run, 2);
        assert!((stats.minimum - 10_000_000.0).abs() < EPSILON);
        assert!((stats.maximum - 13_000_000.0).abs() < EPSILON);
        assert!((stats.median - 11_500_000.0).abs() < EPSILON);
        assert!((stats.mean - 11_500_000.0).abs() < EPSILON);
        assert!((stats.total_duration - 30.0).abs() < EPSILON);
        assert!((stats.raw_min - 10_000.0).abs() < EPSILON);
        assert_eq!(stats.outliers, 0);
        assert_eq!(stats.percentiles.len(), 7);
        assert!((stats.percentiles["0th"] - 10_000_000.0).abs() < EPSILON);
        assert!((stats.percentiles["100th"] - 13_000_000.0).abs() < EPSILON);
    }

    #[test]
    fn test_analyze_rejects_calibration_only_document() {
        let document = RawBenchmarkDocument {
            benchmarks: vec![RawBenchmark {
                runs: vec![run("2025-03-01 10:00:00.000", vec![9.0])],
            }],
        };
        assert!(matches!(analyze(&document), Err(StatsError::EmptySamples)));
    }

    #[test]
    fn test_analyze_rejects_bad_timestamp() {
        let document = RawBenchmarkDocument {
            benchmarks: vec![RawBenchmark {
                runs: vec![
                    run("yesterday", vec![]),
                    run("2025-03-01 10:00:10.000", vec![1.0, 2.0]),
                ],
            }],
        };
        assert!(matches!(
            analyze(&document),
            Err(StatsError::BadTimestamp(_))
        ));
    }
}
