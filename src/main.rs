//! cube-worker - Worker Process Entry Point
//!
//! Connects to the dispatcher and runs the fetch/solve/submit loop until
//! the process is stopped.

use cube_worker::{config::Config, worker::Worker};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cube_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        master_url = %config.master_url,
        worker_id = %config.worker_id,
        solver_path = %config.solver_path,
        "loaded configuration"
    );

    // Missing counter is not fatal at startup: the binary may appear later
    // (shared volume mounts), and every solve fails loudly until it does.
    if !std::path::Path::new(&config.solver_path).exists() {
        warn!(path = %config.solver_path, "counter binary not found");
    }

    let worker = Worker::new(&config)?;

    // Flip the shutdown flag on Ctrl-C; the loop observes it between
    // iterations.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    worker.run(shutdown_rx).await;
    Ok(())
}
