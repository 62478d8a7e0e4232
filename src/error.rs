//! Error types for the benchmark harness.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Every failure is terminal for the run; nothing here is retried.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Pre-flight `count` invocation failed or the binary is missing.
    #[error(
        "could not run database binary at {}: {reason}\nPlease build the project first: cargo build --release",
        .binary.display()
    )]
    Setup { binary: PathBuf, reason: String },

    #[error("{phase} phase failed ({}):\n{stderr}", describe_exit(.code))]
    Process {
        phase: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{phase} phase timed out after {:.1}s; child process killed", .after.as_secs_f64())]
    Timeout {
        phase: &'static str,
        after: Duration,
    },

    #[error("cannot encode command: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_carries_reason_and_build_hint() {
        let err = BenchError::Setup {
            binary: PathBuf::from("./target/release/kvdb"),
            reason: "No such file or directory".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("./target/release/kvdb"));
        assert!(msg.contains("No such file or directory"));
        assert!(msg.contains("cargo build --release"));
    }

    #[test]
    fn process_error_names_phase_code_and_stderr() {
        let err = BenchError::Process {
            phase: "search",
            code: Some(5),
            stderr: "search unsupported".into(),
        };
        assert_eq!(
            err.to_string(),
            "search phase failed (exit code 5):\nsearch unsupported"
        );

        let killed = BenchError::Process {
            phase: "insert",
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("terminated by signal"));
    }
}
