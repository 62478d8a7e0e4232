//! Shared helpers for black-box harness tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use vector_bench::BenchConfig;

/// The in-tree protocol-speaking stub database.
pub fn stub_db() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stub-db"))
}

pub fn config(binary: PathBuf, vectors: usize, dimension: usize, queries: usize) -> BenchConfig {
    BenchConfig {
        binary,
        vectors,
        dimension,
        queries,
        k_top: 5,
        seed: Some(0xBE_2026),
        timeout: Duration::from_secs(60),
    }
}

/// Write an executable `/bin/sh` script standing in for a database binary.
#[cfg(unix)]
pub fn shell_db(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}
