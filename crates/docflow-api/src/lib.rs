//! # docflow-api
//!
//! HTTP API layer for DocFlow built on Axum.
//!
//! Provides the document, attachment, event, task-polling and health
//! endpoints, request logging and CORS middleware, extractors, DTOs, and
//! the mapping of [`AppError`](docflow_core::AppError) kinds to HTTP
//! status codes.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
