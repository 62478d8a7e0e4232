//! Vector database benchmark.
//!
//! Drives a database binary over its stdin command protocol in two phases
//! (insert-only, then insert+search) and reports throughput and latency.
//!
//! Run:    `cargo run --release --bin vector-bench -- --binary ./target/release/kvdb`
//! Quick:  `cargo run --bin vector-bench -- --vectors 1000 --dimension 64 --queries 10`
//! JSON:   `cargo run --bin vector-bench -- --format json > baseline.json`

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::error;

use vector_bench::config::{
    DEFAULT_BINARY, DEFAULT_DIMENSION, DEFAULT_K_TOP, DEFAULT_QUERIES, DEFAULT_VECTORS,
};
use vector_bench::driver::ProcessDriver;
use vector_bench::report::fmt_num;
use vector_bench::{BenchConfig, Orchestrator};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "vector-bench")]
#[command(about = "Insert and search benchmark for line-protocol vector databases", long_about = None)]
struct Cli {
    /// Database binary to benchmark
    #[arg(short, long, default_value = DEFAULT_BINARY)]
    binary: PathBuf,

    /// Number of vectors inserted per phase
    #[arg(short = 'n', long, default_value_t = DEFAULT_VECTORS)]
    vectors: usize,

    /// Vector dimension
    #[arg(short, long, default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    /// Number of search queries in the second phase
    #[arg(short, long, default_value_t = DEFAULT_QUERIES)]
    queries: usize,

    /// Neighbors requested per search
    #[arg(short, long, default_value_t = DEFAULT_K_TOP)]
    k_top: usize,

    /// Seed for a reproducible workload
    #[arg(short, long)]
    seed: Option<u64>,

    /// Per-phase timeout in seconds
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        BenchConfig {
            binary: self.binary.clone(),
            vectors: self.vectors,
            dimension: self.dimension,
            queries: self.queries,
            k_top: self.k_top,
            seed: self.seed,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();

    eprintln!("{}", "=".repeat(60));
    eprintln!("Vector Database Benchmark");
    eprintln!("{}", "=".repeat(60));
    eprintln!("Binary: {}", config.binary.display());
    eprintln!("Number of vectors: {}", fmt_num(config.vectors as u64));
    eprintln!("Vector dimension: {}", config.dimension);
    eprintln!("Queries: {} (k_top={})", config.queries, config.k_top);
    if let Some(seed) = config.seed {
        eprintln!("Seed: {}", seed);
    }
    eprintln!();

    let driver = ProcessDriver::new(config.timeout);
    let mut orchestrator = Orchestrator::new(config, driver);

    let report = match orchestrator.run() {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => match report.render_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}
