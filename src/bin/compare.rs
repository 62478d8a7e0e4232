//! Benchmark comparison tool.
//!
//! Compares two JSON reports from `vector-bench --format json` and prints a
//! table of throughput and latency deltas.
//!
//! Usage: `cargo run --bin bench-compare -- <baseline.json> <candidate.json>`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use vector_bench::report::fmt_num;
use vector_bench::schema::{BenchmarkMetrics, BenchmarkResult, ReportFile};
use vector_bench::Result;

#[derive(Parser)]
#[command(name = "bench-compare", about = "Compare two vector-bench JSON reports")]
struct Cli {
    baseline: PathBuf,
    candidate: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (baseline, candidate) = match (load_report(&cli.baseline), load_report(&cli.candidate)) {
        (Ok(b), Ok(c)) => (b, c),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let base_map: HashMap<&str, &BenchmarkResult> = baseline
        .results
        .iter()
        .map(|r| (r.benchmark.as_str(), r))
        .collect();

    eprintln!("Baseline: {} ({})", cli.baseline.display(), baseline.metadata.timestamp);
    eprintln!("Candidate: {} ({})", cli.candidate.display(), candidate.metadata.timestamp);
    eprintln!();

    println!(
        "{:<36} | {:>14} | {:>14} | {:>16}",
        "Benchmark", "Base", "New", "Delta"
    );
    println!("{}", "-".repeat(88));

    let mut matched = 0u32;
    let mut only_cand = 0u32;
    for cand in &candidate.results {
        match base_map.get(cand.benchmark.as_str()) {
            Some(base) => {
                matched += 1;
                print_comparison(&cand.benchmark, &base.metrics, &cand.metrics);
            }
            None => only_cand += 1,
        }
    }

    let only_base = baseline
        .results
        .iter()
        .filter(|b| !candidate.results.iter().any(|c| c.benchmark == b.benchmark))
        .count();

    println!("{}", "-".repeat(88));
    println!(
        "Compared: {} | Baseline only: {} | Candidate only: {}",
        matched, only_base, only_cand
    );
    ExitCode::SUCCESS
}

fn load_report(path: &Path) -> Result<ReportFile> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_comparison(name: &str, base: &BenchmarkMetrics, cand: &BenchmarkMetrics) {
    if let (Some(base_ns), Some(cand_ns)) = (base.avg_ns, cand.avg_ns) {
        // Lower latency is better.
        let delta_pct = pct_change(base_ns as f64, cand_ns as f64);
        println!(
            "{:<36} | {:>14} | {:>14} | {:>+7.1}% ({})",
            name,
            format_ns(base_ns),
            format_ns(cand_ns),
            delta_pct,
            hint(-delta_pct),
        );
    } else if let (Some(base_ops), Some(cand_ops)) = (base.ops_per_sec, cand.ops_per_sec) {
        let delta_pct = pct_change(base_ops, cand_ops);
        println!(
            "{:<36} | {:>10} op/s | {:>10} op/s | {:>+7.1}% ({})",
            name,
            fmt_num(base_ops as u64),
            fmt_num(cand_ops as u64),
            delta_pct,
            hint(delta_pct),
        );
    } else {
        println!("{:<36} | {:>14} | {:>14} | {:>16}", name, "-", "-", "no data");
    }
}

fn pct_change(base: f64, cand: f64) -> f64 {
    if base > 0.0 {
        (cand - base) / base * 100.0
    } else {
        0.0
    }
}

/// `improvement_pct` is positive when the candidate is better.
fn hint(improvement_pct: f64) -> &'static str {
    if improvement_pct > 1.0 {
        "faster"
    } else if improvement_pct < -1.0 {
        "slower"
    } else {
        "~same"
    }
}

fn format_ns(ns: u64) -> String {
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2} us", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    }
}
