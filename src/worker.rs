//! The fetch / solve / submit loop.
//!
//! One worker process runs one instance of this state machine, strictly
//! sequentially: one task in flight, one counter subprocess at a time.
//! Failures never end the loop; they only pick the length of the next
//! backoff. The dispatcher re-issues any cube whose task or result was
//! dropped on a failure here.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::client::{ClientError, Task, TaskClient, TaskResult};
use crate::config::Config;
use crate::count::{CountExtractor, ExtractedCount};
use crate::formula;
use crate::solver::{Counter, CounterRun};

/// Why the loop is backing off before the next fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffReason {
    /// The dispatcher had no work. Expected and frequent; poll again soon.
    NoWork,
    /// Something failed (RPC, subprocess). Unexpected; wait longer so a
    /// struggling dispatcher is not hammered.
    Fault,
}

/// Current position in the cycle.
#[derive(Debug, PartialEq)]
pub enum LoopState {
    Fetching,
    Solving(Task),
    Submitting(TaskResult),
    Backoff {
        delay: Duration,
        reason: BackoffReason,
    },
}

/// Per-process worker context: identity, dispatcher channel, counter handle,
/// count recognition, and backoff policy. Built once from [`Config`] and
/// immutable afterwards.
pub struct Worker {
    worker_id: String,
    client: TaskClient,
    counter: Counter,
    extractor: CountExtractor,
    idle_backoff: Duration,
    fault_backoff: Duration,
}

impl Worker {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let client = TaskClient::new(
            &config.master_url,
            &config.worker_id,
            config.http_timeout,
        )?;
        Ok(Self {
            worker_id: config.worker_id.clone(),
            client,
            counter: Counter::new(&config.solver_path),
            extractor: CountExtractor::new(),
            idle_backoff: config.idle_backoff,
            fault_backoff: config.fault_backoff,
        })
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Drive the state machine until `shutdown` flips to true.
    ///
    /// Cancellation lands between transitions (or aborts the transition in
    /// flight, which at worst kills the current counter subprocess), so an
    /// external stop never leaves partial state behind. Errors never end
    /// the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(worker_id = %self.worker_id, "worker loop started");
        let mut state = LoopState::Fetching;
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                next = self.step(state) => state = next,
                _ = shutdown.changed() => break,
            }
        }
        info!(worker_id = %self.worker_id, "worker loop stopped");
    }

    /// One transition of the cycle. Exposed so tests can drive the machine
    /// deterministically.
    pub async fn step(&self, state: LoopState) -> LoopState {
        match state {
            LoopState::Fetching => self.fetch().await,
            LoopState::Solving(task) => self.solve(task).await,
            LoopState::Submitting(result) => self.submit(result).await,
            LoopState::Backoff { delay, .. } => {
                tokio::time::sleep(delay).await;
                LoopState::Fetching
            }
        }
    }

    async fn fetch(&self) -> LoopState {
        match self.client.fetch_task().await {
            Ok(task) if task.is_no_work() => {
                debug!("no work available, waiting");
                LoopState::Backoff {
                    delay: self.idle_backoff,
                    reason: BackoffReason::NoWork,
                }
            }
            Ok(task) => {
                info!(
                    task_id = task.task_id,
                    cube_len = task.literals.len(),
                    timeout_sec = task.timeout_sec,
                    "received task"
                );
                LoopState::Solving(task)
            }
            Err(e) => {
                warn!(error = %e, "task fetch failed");
                LoopState::Backoff {
                    delay: self.fault_backoff,
                    reason: BackoffReason::Fault,
                }
            }
        }
    }

    async fn solve(&self, task: Task) -> LoopState {
        let dimacs = formula::assemble(&task);
        let budget = Duration::from_secs(task.timeout_sec);

        match self.counter.run(&dimacs, budget).await {
            Ok(CounterRun::Finished { stdout, duration }) => {
                let extracted = self.extractor.extract(&stdout);
                if extracted == ExtractedCount::Unrecognized {
                    // The wire format has no "invalid" channel, so this is
                    // still reported as a zero count; the log line is the
                    // only trace of the ambiguity.
                    warn!(
                        task_id = task.task_id,
                        stdout_head = %stdout_head(&stdout),
                        "counter output not recognized, reporting zero"
                    );
                }
                let result = TaskResult {
                    task_id: task.task_id,
                    worker_id: self.worker_id.clone(),
                    count: extracted.count_str().to_string(),
                    duration_sec: duration.as_secs_f64(),
                    timed_out: false,
                };
                info!(
                    task_id = task.task_id,
                    count = %result.count,
                    duration_sec = result.duration_sec,
                    "task solved"
                );
                LoopState::Submitting(result)
            }
            Ok(CounterRun::TimedOut { budget }) => {
                warn!(
                    task_id = task.task_id,
                    budget_sec = budget.as_secs(),
                    "counter timed out"
                );
                LoopState::Submitting(TaskResult {
                    task_id: task.task_id,
                    worker_id: self.worker_id.clone(),
                    count: "0".to_string(),
                    duration_sec: budget.as_secs_f64(),
                    timed_out: true,
                })
            }
            Err(e) => {
                error!(task_id = task.task_id, error = %e, "counter invocation failed");
                LoopState::Backoff {
                    delay: self.fault_backoff,
                    reason: BackoffReason::Fault,
                }
            }
        }
    }

    async fn submit(&self, result: TaskResult) -> LoopState {
        match self.client.submit_result(&result).await {
            Ok(()) => {
                debug!(task_id = result.task_id, "result submitted");
                LoopState::Fetching
            }
            Err(e) => {
                // The result is dropped here; re-issuing the cube is the
                // dispatcher's call.
                warn!(task_id = result.task_id, error = %e, "result submission failed");
                LoopState::Backoff {
                    delay: self.fault_backoff,
                    reason: BackoffReason::Fault,
                }
            }
        }
    }
}

fn stdout_head(stdout: &str) -> String {
    stdout.lines().take(3).collect::<Vec<_>>().join("; ")
}
