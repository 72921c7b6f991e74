//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::ApiResponse;
use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match &state.database {
        None => "not_configured",
        Some(pool) => match pool.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Health check could not reach the database");
                "unreachable"
            }
        },
    };
    let status = if database == "unreachable" {
        "degraded"
    } else {
        "ok"
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        document_store: state.documents.store_provider().to_string(),
        tracked_tasks: state.tasks.len(),
    }))
}
