//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use docflow_core::config::AppConfig;
use docflow_database::DatabasePool;
use docflow_service::{DocumentService, TaskTracker};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Database pool, probed by the health endpoint when present
    pub database: Option<DatabasePool>,
    /// Document lifecycle engine
    pub documents: Arc<DocumentService>,
    /// Status of background document creations
    pub tasks: TaskTracker,
}

impl AppState {
    /// Creates the state from its parts.
    pub fn new(
        config: Arc<AppConfig>,
        database: Option<DatabasePool>,
        documents: Arc<DocumentService>,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            config,
            database,
            documents,
            tasks,
        }
    }
}
