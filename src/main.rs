//! genrebox - Main entry point
//!
//! Audio upload and genre classification service: clients upload audio
//! files over HTTP, an external model labels the genre, and the labelled
//! track is stored and queryable. Guest uploads are rate limited per
//! session.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genrebox::config::{Args, Config};
use genrebox::db;
use genrebox::db::tracks::SqliteTrackStore;
use genrebox::services::{FsBlobStore, HttpClassifier, IngestService, UploadLimiter};
use genrebox::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genrebox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();
    let config = Config::resolve(&args).context("Failed to resolve configuration")?;

    info!("Starting genrebox on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());
    info!("Classifier: {}", config.classifier_url);

    // Initialize database (creates root folder and tables as needed)
    let pool = db::init_database_pool(&config.db_path())
        .await
        .context("Failed to initialize database")?;

    std::fs::create_dir_all(config.upload_dir()).context("Failed to create upload directory")?;

    // Wire up the upload pipeline
    let ingest = IngestService::new(
        UploadLimiter::default(),
        Arc::new(FsBlobStore::new(config.upload_dir())),
        Arc::new(SqliteTrackStore::new(pool.clone())),
        Arc::new(HttpClassifier::new(&config.classifier_url)),
    );

    let port = config.port;
    let state = AppState::new(pool, config, ingest);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
