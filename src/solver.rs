//! External counter subprocess execution.
//!
//! The counter is a black box: it takes one positional argument naming its
//! input, reads the DIMACS formula, and prints human-readable result lines
//! to stdout. This module owns spawning it, feeding the formula, capturing
//! stdout, and enforcing the task's wall-clock budget.

use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("failed to spawn counter '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect counter output: {0}")]
    Wait(std::io::Error),
}

/// Outcome of one counter execution.
#[derive(Debug)]
pub enum CounterRun {
    /// The counter finished within budget.
    Finished { stdout: String, duration: Duration },

    /// The deadline elapsed and the child was killed. `budget` is the
    /// declared limit, which is also the duration reported upstream; the
    /// partial stdout of a killed counter is useless and is discarded.
    TimedOut { budget: Duration },
}

/// Handle on the external exact counter binary.
#[derive(Debug, Clone)]
pub struct Counter {
    path: String,
}

impl Counter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run the counter on `formula` with a hard wall-clock budget.
    ///
    /// The formula arrives on the child's stdin and the binary is pointed at
    /// `/dev/stdin`. On timeout the child is killed and its pipes dropped;
    /// no counter process outlives its task.
    pub async fn run(
        &self,
        formula: &str,
        budget: Duration,
    ) -> Result<CounterRun, CounterError> {
        let start = Instant::now();

        let mut child = Command::new(&self.path)
            .arg("/dev/stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CounterError::Spawn {
                path: self.path.clone(),
                source: e,
            })?;

        // Feed the formula from a separate task so a child that fills its
        // stdout pipe before draining stdin cannot deadlock the write. A
        // write failure is not fatal: a counter that decides early (UNSAT)
        // may close stdin before reading all of it.
        if let Some(mut stdin) = child.stdin.take() {
            let formula_bytes = formula.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&formula_bytes).await {
                    debug!("counter stopped reading stdin early: {}", e);
                }
                // Dropping stdin closes the pipe; the counter reads to EOF.
            });
        }

        match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                debug!(
                    exit = ?output.status.code(),
                    stdout_len = stdout.len(),
                    "counter finished"
                );
                Ok(CounterRun::Finished {
                    stdout,
                    duration: start.elapsed(),
                })
            }
            Ok(Err(e)) => Err(CounterError::Wait(e)),
            Err(_) => {
                // Timing out drops the wait future and with it the child
                // handle; kill_on_drop reaps the counter.
                debug!(budget_sec = budget.as_secs_f64(), "counter killed on timeout");
                Ok(CounterRun::TimedOut { budget })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable `/bin/sh` stub standing in for the counter.
    fn stub_counter(body: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "{}", body).unwrap();
        let path = file.into_temp_path();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_finished_captures_stdout() {
        let stub = stub_counter("echo 'c o exact arb 42'");
        let counter = Counter::new(stub.to_str().unwrap());

        let run = counter.run("p cnf 1 1\n1 0\n", Duration::from_secs(5)).await;
        match run.unwrap() {
            CounterRun::Finished { stdout, duration } => {
                assert!(stdout.contains("c o exact arb 42"));
                assert!(duration < Duration::from_secs(5));
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_formula_arrives_via_input_argument() {
        // The stub reads the file named by its first argument, which is the
        // /dev/stdin the worker feeds the formula through.
        let stub = stub_counter("exec cat \"$1\"");
        let counter = Counter::new(stub.to_str().unwrap());
        let formula = "p cnf 3 4\n1 2 0\n-1 3 0\n1 0\n-2 0\n";

        let run = counter.run(formula, Duration::from_secs(5)).await;
        match run.unwrap() {
            CounterRun::Finished { stdout, .. } => assert_eq!(stdout, formula),
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_reports_declared_budget() {
        let stub = stub_counter("sleep 30");
        let counter = Counter::new(stub.to_str().unwrap());
        let budget = Duration::from_millis(200);

        let start = Instant::now();
        let run = counter.run("p cnf 1 1\n1 0\n", budget).await;
        match run.unwrap() {
            CounterRun::TimedOut { budget: reported } => {
                assert_eq!(reported, budget);
                // The child was killed, not waited on for 30s.
                assert!(start.elapsed() < Duration::from_secs(5));
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let counter = Counter::new("/nonexistent/exact-counter");
        let run = counter.run("p cnf 1 1\n1 0\n", Duration::from_secs(1)).await;
        assert!(matches!(run, Err(CounterError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_child_closing_stdin_early_is_not_fatal() {
        // Exits without reading stdin at all; the writer task sees a broken
        // pipe and the run still succeeds.
        let stub = stub_counter("echo 's UNSATISFIABLE'; exit 0");
        let counter = Counter::new(stub.to_str().unwrap());
        let big_formula = "1 0\n".repeat(1 << 16);

        let run = counter.run(&big_formula, Duration::from_secs(5)).await;
        match run.unwrap() {
            CounterRun::Finished { stdout, .. } => {
                assert!(stdout.contains("s UNSATISFIABLE"));
            }
            other => panic!("expected Finished, got {:?}", other),
        }
    }
}
