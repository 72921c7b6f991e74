//! DocFlow Server: outgoing/incoming document lifecycle engine.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use docflow_core::config::AppConfig;
use docflow_core::error::AppError;
use docflow_database::DatabasePool;
use docflow_database::repositories::{
    PgDocumentRepository, PgEventRepository, PgReferenceRepository,
};
use docflow_service::{DocumentService, TaskTracker};

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
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("DOCFLOW_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging.
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

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DocFlow v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    docflow_database::migration::run_migrations(database.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: External document store ──────────────────────────
    let store = docflow_eds::build_store(&config.eds)?;

    // ── Step 3: Repositories and services ────────────────────────
    let pool = database.pool().clone();
    let documents = Arc::new(DocumentService::new(
        Arc::new(PgDocumentRepository::new(pool.clone())),
        Arc::new(PgEventRepository::new(pool.clone())),
        Arc::new(PgReferenceRepository::new(pool)),
        store,
        config.documents.clone(),
    ));

    // ── Step 4: Task tracking ────────────────────────────────────
    let tasks = TaskTracker::new(config.tasks.ttl());
    let sweeper = tasks.spawn_sweeper(config.tasks.sweep_interval());
    tracing::info!(
        ttl_seconds = config.tasks.ttl_seconds,
        sweep_interval_seconds = config.tasks.sweep_interval_seconds,
        "Task sweeper started"
    );

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let state = docflow_api::AppState::new(
        Arc::new(config),
        Some(database.clone()),
        documents,
        tasks,
    );
    let app = docflow_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(address = %addr, "DocFlow server listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    sweeper.abort();
    database.close().await;

    tracing::info!("DocFlow server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
