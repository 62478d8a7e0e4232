//! Full two-phase runs against the in-tree stub database.

mod common;

use std::time::Duration;

use vector_bench::driver::{Driver, ProcessDriver};
use vector_bench::orchestrator::Phase;
use vector_bench::protocol::WorkloadBatch;
use vector_bench::schema::ReportFile;
use vector_bench::Orchestrator;

/// Stub database whose searches take a measurable amount of time, so the
/// derived search cost is reliably positive.
#[cfg(unix)]
fn slow_search_db(dir: &tempfile::TempDir) -> std::path::PathBuf {
    common::shell_db(
        dir,
        "slow-search-db",
        &format!(
            "export STUB_DB_SEARCH_DELAY_MS=20\nexec \"{}\" \"$@\"",
            common::stub_db().display()
        ),
    )
}

// =============================================================================
// Full runs
// =============================================================================

#[cfg(unix)]
#[test]
fn thousand_vectors_eight_dims() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(slow_search_db(&dir), 1_000, 8, 10);
    let mut orch = Orchestrator::new(config.clone(), ProcessDriver::new(config.timeout));

    let report = orch.run().unwrap();
    assert_eq!(orch.phase(), Phase::Done);
    assert_eq!(report.vectors, 1_000);
    assert_eq!(report.dimension, 8);
    assert_eq!(report.queries, 10);
    assert_eq!(report.insert_commands, 1_001);
    assert_eq!(report.total_commands, 1_011);
    assert!(report
        .render_text()
        .contains("Commands sent: insert phase 1,001, search phase 1,011"));

    assert!(!report.has_timing_anomaly());
    for figure in [
        report.insert_throughput(),
        report.avg_insert_ms(),
        report.search_throughput(),
        report.avg_search_ms(),
        report.wall_secs(),
    ] {
        assert!(figure.is_finite() && figure > 0.0, "figure = {}", figure);
    }
    // Ten searches at 20ms each
    assert!(report.search_secs() > 0.1);
}

#[test]
fn plain_stub_run_completes() {
    let config = common::config(common::stub_db(), 200, 16, 5);
    let mut orch = Orchestrator::new(config.clone(), ProcessDriver::new(config.timeout));

    let report = orch.run().unwrap();
    assert_eq!(report.vectors, 200);
    assert!(report.insert_throughput().is_finite());
    assert!(report.render_text().contains("Database size: 200 vectors"));
}

#[test]
fn json_output_matches_schema() {
    let config = common::config(common::stub_db(), 50, 4, 3);
    let mut orch = Orchestrator::new(config.clone(), ProcessDriver::new(config.timeout));
    let report = orch.run().unwrap();

    let parsed: ReportFile = serde_json::from_str(&report.render_json().unwrap()).unwrap();
    let names: Vec<&str> = parsed.results.iter().map(|r| r.benchmark.as_str()).collect();
    assert_eq!(names, vec!["vector/insert/50/4d", "vector/search/50/4d/k5"]);
    assert_eq!(parsed.results[0].metrics.samples, Some(50));
    assert_eq!(parsed.results[1].metrics.samples, Some(3));
}

// =============================================================================
// Driver against the stub
// =============================================================================

#[test]
fn stub_answers_searches_on_stdout() {
    let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
    let batch = WorkloadBatch::insert_then_search(&vectors, &[vec![1.0, 0.0]], 2).unwrap();
    let mut driver = ProcessDriver::new(Duration::from_secs(30));

    let result = driver.run(&common::stub_db(), &batch).unwrap();
    assert!(result.success, "stderr: {}", result.stderr);
    let keys: Vec<&str> = result
        .stdout
        .lines()
        .map(|l| l.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(keys, vec!["vec_0", "vec_2"]);
}

#[test]
fn stub_rejects_dimension_mismatch() {
    let mut builder = WorkloadBatch::builder();
    builder.insert("a", &[1.0, 2.0]).unwrap();
    builder.insert("b", &[1.0, 2.0, 3.0]).unwrap();
    let batch = builder.finish();
    let mut driver = ProcessDriver::new(Duration::from_secs(30));

    let result = driver.run(&common::stub_db(), &batch).unwrap();
    assert!(!result.success);
    assert!(result.stderr.contains("dimension mismatch"));
}

#[test]
fn stub_preflight_reports_count() {
    let mut driver = ProcessDriver::new(Duration::from_secs(30));
    let result = driver.preflight(&common::stub_db()).unwrap();
    assert!(result.success);
    assert_eq!(result.stdout.trim(), "0");
}
