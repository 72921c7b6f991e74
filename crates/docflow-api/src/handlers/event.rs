//! Lifecycle event handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use docflow_core::types::DocumentId;
use docflow_entity::event::DocumentEvent;

use crate::dto::request::AppendEventBody;
use crate::dto::{ApiResponse, validate_body};
use crate::error::ApiError;
use crate::extractors::Editor;
use crate::state::AppState;

/// GET /api/documents/{id}/events
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<ApiResponse<Vec<DocumentEvent>>>, ApiError> {
    let events = state.documents.list_events(id).await?;
    Ok(Json(ApiResponse::ok(events)))
}

/// POST /api/documents/{id}/events
pub async fn append_event(
    State(state): State<AppState>,
    editor: Editor,
    Path(id): Path<DocumentId>,
    Json(body): Json<AppendEventBody>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentEvent>>), ApiError> {
    validate_body(&body)?;
    let event = state
        .documents
        .append_event(&editor, id, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(event))))
}
