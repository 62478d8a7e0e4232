//! Benchmark result types for regression tracking.
//!
//! `vector-bench --format json` prints a [`ReportFile`]; `bench-compare` reads
//! two of them back and prints the deltas.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SCHEMA_VERSION: u32 = 1;

/// Top-level JSON document for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Metadata about this run (hardware, git, timestamp).
    pub metadata: RunMetadata,
    pub results: Vec<BenchmarkResult>,
}

/// Metadata captured when the report is rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// ISO 8601 timestamp.
    pub timestamp: String,
    /// Short git commit hash of the working directory, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Whether the working tree had uncommitted changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_dirty: Option<bool>,
    /// Harness version.
    pub harness_version: String,
    pub hardware: HardwareInfo,
}

/// Hardware information for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: String,
    /// Number of logical cores.
    pub cores: usize,
    /// Total RAM in GB.
    pub ram_gb: u64,
    pub os: String,
    pub arch: String,
}

/// A single measured operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Benchmark name (e.g. "vector/search/100k/786d/k10").
    pub benchmark: String,
    /// "insert" or "search".
    pub category: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    pub metrics: BenchmarkMetrics,
}

/// Fields that don't apply are omitted from JSON output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_per_sec: Option<f64>,
    /// Mean latency per operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ns: Option<u64>,
    /// Wall time attributed to this operation across the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    /// True when the figure was obtained by subtracting two phase timings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<bool>,
}
