//! Task polling handler.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use docflow_core::error::AppError;
use docflow_entity::task::TaskStatus;

use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/tasks/{id}
///
/// A finished task is returned once and then forgotten.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TaskStatus>>, ApiError> {
    let status = state
        .tasks
        .take_terminal(id)
        .ok_or_else(|| AppError::not_found(format!("Task {id} not found or expired")))?;
    Ok(Json(ApiResponse::ok(status)))
}
