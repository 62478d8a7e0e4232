//! Minimal in-memory database speaking the benchmark's line protocol.
//!
//! `stub-db count` prints the record count (always 0, nothing is persisted).
//! `stub-db` with no arguments reads `insert`/`search`/`exit` lines from stdin.
//! A malformed line or a dimension mismatch exits with status 1.
//!
//! `STUB_DB_SEARCH_DELAY_MS` adds a fixed sleep to every search.

use std::collections::HashMap;
use std::io::{self, BufRead, BufWriter, Write};
use std::process::ExitCode;
use std::time::Duration;

use vector_bench::protocol::{parse_line, Command};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => match serve() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        [cmd] if cmd == "count" => {
            println!("0");
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Usage: stub-db [count]");
            ExitCode::from(2)
        }
    }
}

fn serve() -> Result<(), String> {
    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());
    let mut store: HashMap<String, Vec<f32>> = HashMap::new();
    let mut dim: Option<usize> = None;
    let search_delay = std::env::var("STUB_DB_SEARCH_DELAY_MS")
        .ok()
        .and_then(|ms| ms.parse::<u64>().ok())
        .map(Duration::from_millis);

    for (lineno, line) in stdin.lock().lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        if line.trim().is_empty() {
            continue;
        }
        let cmd = parse_line(&line).map_err(|e| format!("line {}: {}", lineno + 1, e))?;
        match cmd {
            Command::Insert { key, vector } => {
                check_dim(&mut dim, vector.len(), lineno)?;
                store.insert(key, vector);
            }
            Command::Search { vector, k_top } => {
                check_dim(&mut dim, vector.len(), lineno)?;
                if let Some(delay) = search_delay {
                    std::thread::sleep(delay);
                }
                let mut scores: Vec<(&str, f32)> = store
                    .iter()
                    .map(|(k, v)| (k.as_str(), dot(&vector, v)))
                    .collect();
                scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                for (key, score) in scores.iter().take(k_top) {
                    writeln!(out, "{} {:.6}", key, score).map_err(|e| e.to_string())?;
                }
            }
            Command::Exit => break,
        }
    }
    out.flush().map_err(|e| e.to_string())
}

fn check_dim(dim: &mut Option<usize>, len: usize, lineno: usize) -> Result<(), String> {
    match *dim {
        Some(d) if d != len => Err(format!(
            "line {}: dimension mismatch (expected {}, got {})",
            lineno + 1,
            d,
            len
        )),
        Some(_) => Ok(()),
        None => {
            *dim = Some(len);
            Ok(())
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
