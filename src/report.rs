//! Derived throughput and latency figures, rendered as text or JSON.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::BenchConfig;
use crate::driver::PhaseResult;
use crate::error::Result;
use crate::metadata;
use crate::schema::{BenchmarkMetrics, BenchmarkResult, ReportFile, SCHEMA_VERSION};

/// Aggregate of both phases plus the workload shape that produced them.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub vectors: usize,
    pub dimension: usize,
    pub queries: usize,
    pub k_top: usize,
    pub insert_time: Duration,
    pub total_time: Duration,
    pub insert_commands: usize,
    pub total_commands: usize,
}

impl BenchmarkReport {
    pub fn new(config: &BenchConfig, insert: &PhaseResult, total: &PhaseResult) -> Self {
        Self {
            vectors: config.vectors,
            dimension: config.dimension,
            queries: config.queries,
            k_top: config.k_top,
            insert_time: insert.elapsed,
            total_time: total.elapsed,
            insert_commands: insert.command_count,
            total_commands: total.command_count,
        }
    }

    pub fn insert_secs(&self) -> f64 {
        self.insert_time.as_secs_f64()
    }

    pub fn total_secs(&self) -> f64 {
        self.total_time.as_secs_f64()
    }

    /// `total - insert`; negative when the subtraction assumption broke.
    pub fn search_secs(&self) -> f64 {
        self.total_secs() - self.insert_secs()
    }

    pub fn avg_search_ms(&self) -> f64 {
        self.search_secs() / self.queries as f64 * 1_000.0
    }

    pub fn search_throughput(&self) -> f64 {
        self.queries as f64 / self.search_secs()
    }

    pub fn insert_throughput(&self) -> f64 {
        self.vectors as f64 / self.insert_secs()
    }

    pub fn avg_insert_ms(&self) -> f64 {
        self.insert_secs() / self.vectors as f64 * 1_000.0
    }

    /// Wall time spent inside both phases.
    pub fn wall_secs(&self) -> f64 {
        self.insert_secs() + self.total_secs()
    }

    /// A non-positive derived search time is not a measurement.
    pub fn has_timing_anomaly(&self) -> bool {
        self.search_secs() <= 0.0
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// One result per measured operation, in the shared JSON schema.
    pub fn to_results(&self) -> Vec<BenchmarkResult> {
        let mut params = HashMap::new();
        params.insert("vectors".into(), serde_json::json!(self.vectors));
        params.insert("dim".into(), serde_json::json!(self.dimension));
        params.insert("queries".into(), serde_json::json!(self.queries));
        params.insert("k_top".into(), serde_json::json!(self.k_top));

        let insert = BenchmarkResult {
            benchmark: format!("vector/insert/{}/{}d", scale_label(self.vectors), self.dimension),
            category: "insert".to_string(),
            parameters: with_commands(&params, self.insert_commands),
            metrics: BenchmarkMetrics {
                ops_per_sec: Some(self.insert_throughput()),
                avg_ns: Some(per_op_ns(self.insert_secs(), self.vectors)),
                total_secs: Some(self.insert_secs()),
                samples: Some(self.vectors as u64),
                ..Default::default()
            },
        };

        let mut search_metrics = BenchmarkMetrics {
            total_secs: Some(self.search_secs()),
            samples: Some(self.queries as u64),
            derived: Some(true),
            ..Default::default()
        };
        if !self.has_timing_anomaly() {
            search_metrics.ops_per_sec = Some(self.search_throughput());
            search_metrics.avg_ns = Some(per_op_ns(self.search_secs(), self.queries));
        }
        let search = BenchmarkResult {
            benchmark: format!(
                "vector/search/{}/{}d/k{}",
                scale_label(self.vectors),
                self.dimension,
                self.k_top
            ),
            category: "search".to_string(),
            parameters: with_commands(&params, self.total_commands),
            metrics: search_metrics,
        };

        vec![insert, search]
    }

    /// Full JSON document with run metadata, for regression tracking.
    pub fn render_json(&self) -> Result<String> {
        let file = ReportFile {
            schema_version: SCHEMA_VERSION,
            metadata: metadata::capture(),
            results: self.to_results(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Benchmark Summary")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Database size: {} vectors", fmt_num(self.vectors as u64))?;
        writeln!(f, "Vector dimension: {}", self.dimension)?;
        writeln!(
            f,
            "Commands sent: insert phase {}, search phase {}",
            fmt_num(self.insert_commands as u64),
            fmt_num(self.total_commands as u64)
        )?;
        writeln!(f)?;
        writeln!(f, "Insertion Performance:")?;
        writeln!(f, "  Total time: {:.3} seconds", self.insert_secs())?;
        writeln!(f, "  Throughput: {:.2} inserts/sec", self.insert_throughput())?;
        writeln!(f, "  Average per insert: {:.3} ms", self.avg_insert_ms())?;
        writeln!(f)?;
        writeln!(
            f,
            "Search Performance ({} random searches, k_top={}):",
            self.queries, self.k_top
        )?;
        writeln!(f, "  Total time: {:.3} seconds", self.search_secs())?;
        if self.has_timing_anomaly() {
            writeln!(f, "  Average per search: n/a")?;
            writeln!(f, "  Throughput: n/a")?;
            writeln!(
                f,
                "  WARNING: derived search time is not positive; phase timings are inconsistent"
            )?;
        } else {
            writeln!(f, "  Average per search: {:.3} ms", self.avg_search_ms())?;
            writeln!(f, "  Throughput: {:.2} searches/sec", self.search_throughput())?;
        }
        writeln!(f)?;
        writeln!(f, "Total benchmark time: {:.3} seconds", self.wall_secs())?;
        writeln!(f, "{}", rule)
    }
}

/// Shared workload parameters plus the command count of one phase.
fn with_commands(
    params: &HashMap<String, serde_json::Value>,
    commands: usize,
) -> HashMap<String, serde_json::Value> {
    let mut params = params.clone();
    params.insert("commands".into(), serde_json::json!(commands));
    params
}

fn per_op_ns(secs: f64, ops: usize) -> u64 {
    (secs / ops as f64 * 1e9).round() as u64
}

pub fn fmt_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn scale_label(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{}m", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}
