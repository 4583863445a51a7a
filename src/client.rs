//! Dispatcher RPC boundary.
//!
//! The dispatcher owns cube generation, the work queue, and aggregation;
//! the worker only consumes its two-operation contract: fetch a task,
//! submit a result. Both are JSON POSTs over a single pooled HTTP client
//! that is built once at startup and used sequentially for the process's
//! lifetime.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Reserved task id meaning "no work available right now".
pub const NO_WORK_TASK_ID: i64 = -1;

/// A cube task as shipped by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i64,
    /// Declared variable count of the base formula.
    pub num_vars: u32,
    /// Declared clause count of the base formula, excluding the cube.
    pub num_clauses: u32,
    /// The cube: unit-literal assumptions, order-significant.
    pub literals: Vec<i32>,
    /// Base formula clause text, verbatim.
    pub formula_body: String,
    /// Wall-clock budget for the solve, in seconds.
    pub timeout_sec: u64,
}

impl Task {
    /// Whether this is the dispatcher's "no work" sentinel rather than a
    /// real task.
    pub fn is_no_work(&self) -> bool {
        self.task_id == NO_WORK_TASK_ID
    }
}

/// A completed (or timed-out) computation, reported back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: i64,
    pub worker_id: String,
    /// Exact model count as a decimal string; counts can exceed u64.
    pub count: String,
    /// Measured elapsed seconds, or the declared budget when timed out.
    pub duration_sec: f64,
    pub timed_out: bool,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to dispatcher failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dispatcher returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not decode dispatcher response: {0}")]
    Decode(serde_json::Error),
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    worker_id: &'a str,
}

/// HTTP client for the dispatcher's two-operation contract.
pub struct TaskClient {
    http: reqwest::Client,
    master_url: String,
    worker_id: String,
}

impl TaskClient {
    /// Build the client for a dispatcher base URL. `http_timeout` bounds
    /// every individual request; the dispatcher long-polls fetches when its
    /// queue is empty, so keep this comfortably above its hold time.
    pub fn new(
        master_url: impl Into<String>,
        worker_id: impl Into<String>,
        http_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(http_timeout).build()?;
        let master_url: String = master_url.into();
        let master_url = master_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            master_url,
            worker_id: worker_id.into(),
        })
    }

    /// Ask the dispatcher for the next task.
    ///
    /// The response is either a real task or the no-work sentinel
    /// (`task_id == -1`); callers must check [`Task::is_no_work`] before
    /// solving.
    pub async fn fetch_task(&self) -> Result<Task, ClientError> {
        let url = format!("{}/v1/task/fetch", self.master_url);
        let response = self
            .http
            .post(&url)
            .json(&FetchRequest {
                worker_id: &self.worker_id,
            })
            .send()
            .await?;
        let body = Self::success_body(response).await?;
        let task: Task = serde_json::from_str(&body).map_err(ClientError::Decode)?;
        debug!(task_id = task.task_id, "fetched task");
        Ok(task)
    }

    /// Report a finished computation.
    ///
    /// Fire-and-forget: the acknowledgement body is ignored and a failed
    /// submit is never retried here. If the dispatcher cares about the lost
    /// cube it re-issues the task.
    pub async fn submit_result(&self, result: &TaskResult) -> Result<(), ClientError> {
        let url = format!("{}/v1/task/submit", self.master_url);
        let response = self.http.post(&url).json(result).send().await?;
        Self::success_body(response).await?;
        debug!(task_id = result.task_id, "result accepted");
        Ok(())
    }

    async fn success_body(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::Status {
                code: status.as_u16(),
                body,
            })
        }
    }
}
