//! Child-process driver: spawn the database, feed it a workload, wait for exit.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{BenchError, Result};
use crate::protocol::WorkloadBatch;

/// Argument that asks the database for its record count and exits.
pub const PREFLIGHT_ARG: &str = "count";

const POLL_INTERVAL: Duration = Duration::from_micros(250);
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Outcome of one spawn-write-wait cycle.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    /// Wall time from spawn to observed exit.
    pub elapsed: Duration,
    pub command_count: usize,
    pub success: bool,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the orchestrator and the process it measures.
pub trait Driver {
    /// Run `<binary> count` with no input.
    fn preflight(&mut self, binary: &Path) -> Result<PhaseResult>;

    /// Run `<binary>` with `workload` on stdin.
    fn run(&mut self, binary: &Path, workload: &WorkloadBatch) -> Result<PhaseResult>;
}

/// Drives a real child process with a bounded wait.
pub struct ProcessDriver {
    timeout: Duration,
}

impl ProcessDriver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn invoke(
        &self,
        binary: &Path,
        args: &[&str],
        input: Option<Arc<str>>,
        command_count: usize,
        phase: &'static str,
    ) -> Result<PhaseResult> {
        debug!("spawning {} {:?} ({} phase)", binary.display(), args, phase);

        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut child = Command::new(binary)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Writer and readers are detached and report over channels. A
        // grandchild that inherits a pipe can keep them blocked, but never
        // past the deadline.
        let stdin = child.stdin.take();
        let writer = detach(move || write_input(stdin, input.as_deref()));
        let stdout = child.stdout.take();
        let out_reader = detach(move || read_all(stdout));
        let stderr = child.stderr.take();
        let err_reader = detach(move || read_all(stderr));

        let status = match wait_until(&mut child, deadline)? {
            Some(status) => status,
            None => return Err(self.timed_out(phase)),
        };
        let elapsed = start.elapsed();

        let write_result = recv_by(&writer, deadline).ok_or_else(|| self.timed_out(phase))?;
        write_result?;
        let stdout = recv_by(&out_reader, deadline).ok_or_else(|| self.timed_out(phase))?;
        let stderr = recv_by(&err_reader, deadline).ok_or_else(|| self.timed_out(phase))?;

        debug!(
            "{} phase exited with {} after {:.3}s",
            phase,
            status,
            elapsed.as_secs_f64()
        );

        Ok(PhaseResult {
            elapsed,
            command_count,
            success: status.success(),
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    fn timed_out(&self, phase: &'static str) -> BenchError {
        warn!(
            "{} phase exceeded {:.1}s, child killed",
            phase,
            self.timeout.as_secs_f64()
        );
        BenchError::Timeout {
            phase,
            after: self.timeout,
        }
    }
}

impl Driver for ProcessDriver {
    fn preflight(&mut self, binary: &Path) -> Result<PhaseResult> {
        self.invoke(binary, &[PREFLIGHT_ARG], None, 1, "pre-flight")
    }

    fn run(&mut self, binary: &Path, workload: &WorkloadBatch) -> Result<PhaseResult> {
        let phase = if workload.search_count() == 0 {
            "insert"
        } else {
            "search"
        };
        self.invoke(
            binary,
            &[],
            Some(workload.shared_text()),
            workload.command_count(),
            phase,
        )
    }
}

/// Write the whole workload, then drop stdin to signal end of input.
///
/// A broken pipe means the child exited early; its exit status reports that.
fn write_input(stdin: Option<ChildStdin>, input: Option<&str>) -> io::Result<()> {
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };
    match stdin.write_all(input.as_bytes()).and_then(|_| stdin.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn read_all<R: Read>(source: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut source) = source {
        let _ = source.read_to_end(&mut buf);
    }
    buf
}

/// Run `f` on its own thread; the result arrives on the returned channel.
fn detach<T, F>(f: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx
}

/// `None` if nothing arrived by the deadline. A child that exits right at the
/// deadline still gets [`DRAIN_GRACE`] for its output to be collected.
fn recv_by<T>(rx: &Receiver<T>, deadline: Instant) -> Option<T> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    rx.recv_timeout(remaining.max(DRAIN_GRACE)).ok()
}

/// `Ok(None)` on timeout, after the child has been killed and reaped.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("db.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn batch() -> WorkloadBatch {
        WorkloadBatch::insert_only(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap()
    }

    #[test]
    fn captures_stdout_of_successful_child() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "cat");
        let mut driver = ProcessDriver::new(Duration::from_secs(10));

        let result = driver.run(&bin, &batch()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.command_count, 3);
        assert_eq!(result.stdout, batch().as_str());
    }

    #[test]
    fn nonzero_exit_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "cat >/dev/null; echo 'dimension mismatch' >&2; exit 3");
        let mut driver = ProcessDriver::new(Duration::from_secs(10));

        let result = driver.run(&bin, &batch()).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("dimension mismatch"));
    }

    #[test]
    fn child_ignoring_stdin_does_not_hang() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "exit 0");
        let mut driver = ProcessDriver::new(Duration::from_secs(10));

        let big = WorkloadBatch::insert_only(&vec![vec![0.5f32; 256]; 2_000]).unwrap();
        let result = driver.run(&bin, &big).unwrap();
        assert!(result.success);
    }

    #[test]
    fn hung_child_is_killed_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "exec sleep 30");
        let mut driver = ProcessDriver::new(Duration::from_millis(200));

        let start = Instant::now();
        let err = driver.run(&bin, &batch()).unwrap_err();
        assert!(matches!(err, BenchError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn timeout_holds_when_grandchild_keeps_stdin_open() {
        let dir = tempfile::tempdir().unwrap();
        // No `exec`: the shell is killed but `sleep` keeps the pipes.
        let bin = script(&dir, "sleep 8");
        let mut driver = ProcessDriver::new(Duration::from_millis(200));

        let big = WorkloadBatch::insert_only(&vec![vec![0.5f32; 256]; 2_000]).unwrap();
        let start = Instant::now();
        let err = driver.run(&bin, &big).unwrap_err();
        assert!(matches!(err, BenchError::Timeout { phase: "insert", .. }));
        assert!(start.elapsed() < Duration::from_secs(4), "took {:?}", start.elapsed());
    }

    #[test]
    fn output_collection_is_bounded_after_exit() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "cat >/dev/null\nsleep 8 &\nexit 0");
        let mut driver = ProcessDriver::new(Duration::from_millis(500));

        let start = Instant::now();
        let err = driver.run(&bin, &batch()).unwrap_err();
        assert!(matches!(err, BenchError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4), "took {:?}", start.elapsed());
    }

    #[test]
    fn preflight_passes_count_argument() {
        let dir = tempfile::tempdir().unwrap();
        let bin = script(&dir, "[ \"$1\" = count ] && echo 0");
        let mut driver = ProcessDriver::new(Duration::from_secs(10));

        let result = driver.preflight(&bin).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "0");
    }

    #[test]
    fn missing_binary_is_io_error() {
        let mut driver = ProcessDriver::new(Duration::from_secs(1));
        let err = driver
            .preflight(Path::new("/nonexistent/kvdb-binary"))
            .unwrap_err();
        assert!(matches!(err, BenchError::Io(_)));
    }
}
