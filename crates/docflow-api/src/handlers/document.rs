//! Document CRUD, search and background creation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::{info, warn};

use docflow_core::types::{DocumentId, PageResponse};
use docflow_entity::document::Document;

use crate::dto::request::{CreateDocumentBody, SearchBody, UpdateDocumentBody};
use crate::dto::response::{MessageResponse, TaskAccepted};
use crate::dto::{ApiResponse, validate_body};
use crate::error::ApiError;
use crate::extractors::{Editor, PaginationParams};
use crate::state::AppState;

/// GET /api/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Document>>>, ApiError> {
    let page = state
        .documents
        .search(&[], params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/documents/search
pub async fn search_documents(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Json(body): Json<SearchBody>,
) -> Result<Json<ApiResponse<PageResponse<Document>>>, ApiError> {
    let page = state
        .documents
        .search(&body.groups, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let document = state.documents.get(id).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// POST /api/documents
pub async fn create_document(
    State(state): State<AppState>,
    editor: Editor,
    Json(body): Json<CreateDocumentBody>,
) -> Result<(StatusCode, Json<ApiResponse<Document>>), ApiError> {
    validate_body(&body)?;
    let request = body.into_request()?;

    let document = state.documents.create(&editor, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(document))))
}

/// POST /api/documents/async
///
/// Registers the document in the background; poll `/api/tasks/{id}`.
pub async fn create_document_async(
    State(state): State<AppState>,
    Editor(ctx): Editor,
    Json(body): Json<CreateDocumentBody>,
) -> Result<(StatusCode, Json<ApiResponse<TaskAccepted>>), ApiError> {
    validate_body(&body)?;
    let request = body.into_request()?;

    let tasks = state.tasks.clone();
    let documents = state.documents.clone();
    let task_id = tasks.create("Registering document");
    info!(task_id = %task_id, request_id = %ctx.request_id, "Document creation accepted");

    tokio::spawn(async move {
        if let Err(e) = documents
            .create_tracked(&ctx, request, &tasks, task_id)
            .await
        {
            warn!(task_id = %task_id, error = %e, "Background document creation failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(TaskAccepted { task_id })),
    ))
}

/// PUT /api/documents/{id}
pub async fn update_document(
    State(state): State<AppState>,
    editor: Editor,
    Path(id): Path<DocumentId>,
    Json(body): Json<UpdateDocumentBody>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    validate_body(&body)?;
    let document = state.documents.update(&editor, id, body.into()).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// DELETE /api/documents/{id}
pub async fn delete_document(
    State(state): State<AppState>,
    editor: Editor,
    Path(id): Path<DocumentId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.documents.delete(&editor, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "Document {id} deleted"
    )))))
}
