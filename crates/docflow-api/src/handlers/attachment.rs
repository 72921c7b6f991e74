//! Attachment handlers.

use axum::Json;
use axum::extract::{Path, State};

use docflow_core::types::DocumentId;
use docflow_entity::document::Document;

use crate::dto::request::AttachmentsBody;
use crate::dto::{ApiResponse, validate_body};
use crate::error::ApiError;
use crate::extractors::Editor;
use crate::state::AppState;

/// POST /api/documents/{id}/attachments
pub async fn append_attachments(
    State(state): State<AppState>,
    editor: Editor,
    Path(id): Path<DocumentId>,
    Json(body): Json<AttachmentsBody>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    validate_body(&body)?;
    let uploads = body.into_uploads()?;
    let document = state
        .documents
        .append_attachments(&editor, id, uploads)
        .await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// PUT /api/documents/{id}/attachments
pub async fn replace_attachments(
    State(state): State<AppState>,
    editor: Editor,
    Path(id): Path<DocumentId>,
    Json(body): Json<AttachmentsBody>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    validate_body(&body)?;
    let uploads = body.into_uploads()?;
    let document = state
        .documents
        .replace_attachments(&editor, id, uploads)
        .await?;
    Ok(Json(ApiResponse::ok(document)))
}
