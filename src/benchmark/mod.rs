//! Benchmark statistics engine
//!
//! Turns the harness's raw timing-sample document into the descriptive
//! statistics persisted with a successful submission.

pub mod stats;

pub use stats::{StatsError, analyze};
