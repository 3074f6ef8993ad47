//! # SplitBill API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SplitBill API Server                             │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► Router ───► BillEditor ───► SQLite       │
//! │                                  ▲                                      │
//! │  Extraction workflow ────────────┘  (process-data callback)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use splitbill_api::{create_router, ApiConfig, AppState};
use splitbill_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os("SPLITBILL_CONFIG").map(PathBuf::from);
    let config = ApiConfig::load(config_path)?;

    // SPLITBILL_LOG is already folded into config.logging.filter
    let filter = match std::env::var("SPLITBILL_LOG") {
        Ok(_) => EnvFilter::new(&config.logging.filter),
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting SplitBill API server...");
    info!(
        addr = %config.bind_address(),
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;
    info!("Database ready");

    let app = create_router(AppState::new(db.clone()));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %config.bind_address(), "Listening");

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
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
