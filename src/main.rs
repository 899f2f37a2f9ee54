//! NestDrive daemon: runs the background reconciliation sweep.
//!
//! Wires the configured backends, registers the scheduled jobs, and runs
//! until Ctrl+C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use nestdrive_core::config::AppConfig;
use nestdrive_core::error::AppError;
use nestdrive_service::AppState;
use nestdrive_worker::jobs::ReconcileJobHandler;
use nestdrive_worker::{IntervalScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Daemon error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("NESTDRIVE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("NESTDRIVE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting NestDrive daemon");

    // ── Step 1: Backends and services ────────────────────────────
    let worker_config = config.worker.clone();
    let state = AppState::from_config(config).await?;

    if !state.store.health_check().await? {
        return Err(AppError::database("Namespace store failed its health check"));
    }
    if !state.objects.store().health_check().await? {
        return Err(AppError::storage("Object store failed its health check"));
    }

    // ── Step 2: Scheduled jobs ───────────────────────────────────
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ReconcileJobHandler::new(state.reconciler.clone())));
    let scheduler =
        IntervalScheduler::new(Arc::new(executor)).with_default_tasks(&worker_config);

    let cancel = CancellationToken::new();
    let worker = tokio::spawn(scheduler.run(cancel.clone()));

    // ── Step 3: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    if tokio::time::timeout(Duration::from_secs(30), worker).await.is_err() {
        tracing::warn!("Background jobs did not stop within 30s");
    }

    tracing::info!("NestDrive daemon shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
