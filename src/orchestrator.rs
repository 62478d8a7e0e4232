//! Two-phase benchmark sequencing.
//!
//! ```text
//! Precheck ──ok──> InsertOnly ──ok──> InsertAndSearch ──ok──> Done
//!     │                │                    │
//!     └──────err───────┴─────────err────────┴──────> Aborted
//! ```
//!
//! The database offers no per-command timestamps, so search cost is derived:
//! phase 2 replays the phase-1 inserts in a fresh process, appends the
//! searches, and `search_time = total_time - insert_time`.

use std::fmt;

use log::{error, info, warn};

use crate::config::BenchConfig;
use crate::driver::{Driver, PhaseResult};
use crate::error::{BenchError, Result};
use crate::generator::VectorGenerator;
use crate::protocol::WorkloadBatch;
use crate::report::BenchmarkReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Precheck,
    InsertOnly,
    InsertAndSearch,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Precheck => "precheck",
            Phase::InsertOnly => "insert",
            Phase::InsertAndSearch => "insert+search",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

pub struct Orchestrator<D> {
    config: BenchConfig,
    driver: D,
    generator: VectorGenerator,
    phase: Phase,
}

impl<D: Driver> Orchestrator<D> {
    pub fn new(config: BenchConfig, driver: D) -> Self {
        let generator = VectorGenerator::new(config.seed);
        Self {
            config,
            driver,
            generator,
            phase: Phase::Precheck,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run both phases. Any failure moves to [`Phase::Aborted`] and no report
    /// is produced.
    pub fn run(&mut self) -> Result<BenchmarkReport> {
        match self.run_phases() {
            Ok(report) => {
                self.transition(Phase::Done);
                Ok(report)
            }
            Err(e) => {
                error!("benchmark aborted during {} phase", self.phase);
                self.transition(Phase::Aborted);
                Err(e)
            }
        }
    }

    fn run_phases(&mut self) -> Result<BenchmarkReport> {
        self.config.validate()?;
        self.precheck()?;

        let config = &self.config;
        info!(
            "generating {} random {}-d vectors",
            config.vectors, config.dimension
        );
        let vectors = self.generator.generate_many(config.vectors, config.dimension);

        self.transition(Phase::InsertOnly);
        let insert_batch = WorkloadBatch::insert_only(&vectors)?;
        let insert = self.run_phase(&insert_batch, "insert")?;
        drop(insert_batch);

        self.transition(Phase::InsertAndSearch);
        let queries = self
            .generator
            .generate_many(self.config.queries, self.config.dimension);
        let combined_batch =
            WorkloadBatch::insert_then_search(&vectors, &queries, self.config.k_top)?;
        let total = self.run_phase(&combined_batch, "search")?;

        let report = BenchmarkReport::new(&self.config, &insert, &total);
        if report.has_timing_anomaly() {
            warn!(
                "derived search time is {:.3}s (total {:.3}s - insert {:.3}s); \
                 phase timings are inconsistent",
                report.search_secs(),
                report.total_secs(),
                report.insert_secs()
            );
        }
        Ok(report)
    }

    fn precheck(&mut self) -> Result<()> {
        let binary = self.config.binary.clone();
        info!("pre-flight check: {} count", binary.display());
        let result = self.driver.preflight(&binary).map_err(|e| BenchError::Setup {
            binary: binary.clone(),
            reason: e.to_string(),
        })?;
        if !result.success {
            return Err(BenchError::Setup {
                binary,
                reason: format!("pre-flight exited unsuccessfully: {}", result.stderr.trim()),
            });
        }
        Ok(())
    }

    fn run_phase(&mut self, batch: &WorkloadBatch, phase: &'static str) -> Result<PhaseResult> {
        info!(
            "{} phase: {} commands ({} inserts, {} searches)",
            phase,
            batch.command_count(),
            batch.insert_count(),
            batch.search_count()
        );
        let result = self.driver.run(&self.config.binary, batch)?;
        if !result.success {
            return Err(BenchError::Process {
                phase,
                code: result.exit_code,
                stderr: result.stderr,
            });
        }
        info!("{} phase finished in {:.3}s", phase, result.elapsed.as_secs_f64());
        Ok(result)
    }

    fn transition(&mut self, next: Phase) {
        info!("phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}
