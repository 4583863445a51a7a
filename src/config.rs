//! Configuration management for the worker.
//!
//! Configuration can be set via environment variables:
//! - `CUBE_WORKER_MASTER_URL` - Required. Base URL of the dispatcher, e.g. `http://master:50051`.
//! - `CUBE_WORKER_ID` - Optional. Identity reported to the dispatcher. Defaults to a generated `worker-<hex>` id.
//! - `CUBE_WORKER_SOLVER_PATH` - Optional. Path to the exact counter binary. Defaults to `/usr/local/bin/ganak`.
//! - `CUBE_WORKER_IDLE_BACKOFF_SEC` - Optional. Sleep after a no-work fetch. Defaults to `2`.
//! - `CUBE_WORKER_FAULT_BACKOFF_SEC` - Optional. Sleep after any failure. Defaults to `5`.
//! - `CUBE_WORKER_HTTP_TIMEOUT_SEC` - Optional. Per-request timeout toward the dispatcher. Defaults to `30`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Worker configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dispatcher base URL
    pub master_url: String,

    /// Identity reported on every fetch and submit
    pub worker_id: String,

    /// Path to the exact counter binary
    pub solver_path: String,

    /// Sleep after the dispatcher reports no work
    pub idle_backoff: Duration,

    /// Sleep after an RPC or solve failure
    pub fault_backoff: Duration,

    /// Per-request timeout for dispatcher calls
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `CUBE_WORKER_MASTER_URL` is
    /// not set, or `ConfigError::InvalidValue` for unparseable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let master_url = std::env::var("CUBE_WORKER_MASTER_URL")
            .map_err(|_| ConfigError::MissingEnvVar("CUBE_WORKER_MASTER_URL".to_string()))?;

        let worker_id =
            std::env::var("CUBE_WORKER_ID").unwrap_or_else(|_| default_worker_id());

        let solver_path = std::env::var("CUBE_WORKER_SOLVER_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/ganak".to_string());

        let idle_backoff = secs_var("CUBE_WORKER_IDLE_BACKOFF_SEC", 2)?;
        let fault_backoff = secs_var("CUBE_WORKER_FAULT_BACKOFF_SEC", 5)?;
        let http_timeout = secs_var("CUBE_WORKER_HTTP_TIMEOUT_SEC", 30)?;

        Ok(Self {
            master_url,
            worker_id,
            solver_path,
            idle_backoff,
            fault_backoff,
            http_timeout,
        })
    }
}

/// Generated identity for workers that don't configure one. Short enough for
/// log lines, unique enough for dispatcher bookkeeping.
fn default_worker_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("worker-{}", &id[..8])
}

fn secs_var(name: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_id_shape() {
        let id = default_worker_id();
        assert!(id.starts_with("worker-"));
        assert_eq!(id.len(), "worker-".len() + 8);
        assert_ne!(id, default_worker_id());
    }

    #[test]
    fn test_secs_var_default_applies() {
        assert_eq!(
            secs_var("CUBE_WORKER_TEST_UNSET_VAR", 7).unwrap(),
            Duration::from_secs(7)
        );
    }
}
