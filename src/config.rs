//! Benchmark configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BenchError, Result};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_BINARY: &str = "./target/release/kvdb";
pub const DEFAULT_VECTORS: usize = 100_000;
pub const DEFAULT_DIMENSION: usize = 786;
pub const DEFAULT_QUERIES: usize = 100;
pub const DEFAULT_K_TOP: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Everything a run needs, passed explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Path to the database binary under test.
    pub binary: PathBuf,
    /// Number of vectors inserted in each phase.
    pub vectors: usize,
    pub dimension: usize,
    /// Number of search commands appended in the second phase.
    pub queries: usize,
    pub k_top: usize,
    /// Fixed RNG seed. `None` draws a fresh workload every run.
    pub seed: Option<u64>,
    /// Upper bound on a single phase, including process startup.
    pub timeout: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            vectors: DEFAULT_VECTORS,
            dimension: DEFAULT_DIMENSION,
            queries: DEFAULT_QUERIES,
            k_top: DEFAULT_K_TOP,
            seed: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BenchConfig {
    /// Reject configurations that would produce an empty or malformed workload.
    pub fn validate(&self) -> Result<()> {
        if self.vectors == 0 {
            return Err(BenchError::Config("vector count must be positive".into()));
        }
        if self.dimension == 0 {
            return Err(BenchError::Config("dimension must be positive".into()));
        }
        if self.queries == 0 {
            return Err(BenchError::Config("query count must be positive".into()));
        }
        if self.k_top == 0 {
            return Err(BenchError::Config("k_top must be positive".into()));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::Config("timeout must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BenchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dimension_rejected() {
        let config = BenchConfig {
            dimension: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));
    }

    #[test]
    fn zero_counts_rejected() {
        for config in [
            BenchConfig { vectors: 0, ..Default::default() },
            BenchConfig { queries: 0, ..Default::default() },
            BenchConfig { k_top: 0, ..Default::default() },
            BenchConfig { timeout: Duration::ZERO, ..Default::default() },
        ] {
            assert!(config.validate().is_err());
        }
    }
}
