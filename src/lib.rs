//! Load generation and measurement harness for vector databases that speak a
//! line-oriented command protocol over standard input.
//!
//! A run spawns the target binary twice: once with an insert-only workload and
//! once with the same inserts followed by searches. Search cost is derived by
//! subtracting the first wall time from the second.

pub mod config;
pub mod driver;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod orchestrator;
pub mod protocol;
pub mod report;
pub mod schema;

pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use orchestrator::Orchestrator;
pub use report::BenchmarkReport;
