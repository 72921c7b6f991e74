//! Route definitions for the DocFlow HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes, threading `state` through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    let api_routes = Router::new()
        .merge(document_routes())
        .merge(event_routes())
        .merge(task_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Document CRUD, search, and attachments
fn document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/documents",
            get(handlers::document::list_documents).post(handlers::document::create_document),
        )
        .route(
            "/documents/async",
            post(handlers::document::create_document_async),
        )
        .route(
            "/documents/search",
            post(handlers::document::search_documents),
        )
        .route(
            "/documents/{id}",
            get(handlers::document::get_document)
                .put(handlers::document::update_document)
                .delete(handlers::document::delete_document),
        )
        .route(
            "/documents/{id}/attachments",
            post(handlers::attachment::append_attachments)
                .put(handlers::attachment::replace_attachments),
        )
}

/// Lifecycle events
fn event_routes() -> Router<AppState> {
    Router::new().route(
        "/documents/{id}/events",
        get(handlers::event::list_events).post(handlers::event::append_event),
    )
}

/// Background task polling
fn task_routes() -> Router<AppState> {
    Router::new().route("/tasks/{id}", get(handlers::task::get_task))
}

/// Health
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
