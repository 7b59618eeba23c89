//! # Stockroom API Server
//!
//! Startup sequence:
//!
//! ```text
//! tracing ──► ApiConfig::load ──► Database::new (migrations) ──► axum::serve
//!                                        │
//!                                 failure: log + exit 1
//! ```

use std::process::ExitCode;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stockroom_api::config::ApiConfig;
use stockroom_api::{build_router, AppState};
use stockroom_db::{Database, DbConfig};

const DEFAULT_LOG_FILTER: &str = "stockroom_api=info,stockroom_db=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting Stockroom API server...");

    let config = ApiConfig::load().context("invalid configuration")?;
    let addr = config.bind_addr()?;
    info!(
        %addr,
        database_url = %config.database_url,
        low_stock_threshold = config.low_stock_threshold,
        "Configuration loaded"
    );

    // No retry: an unreachable database stops the process
    let db_config = DbConfig::new(&config.database_url).max_connections(config.db_max_connections);
    let db = Database::new(db_config)
        .await
        .context("failed to open database")?;

    let status = db.migration_status().await?;
    info!(applied = status.applied, total = status.total, "Database ready");

    let app = build_router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
