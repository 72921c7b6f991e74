//! Progress of a long-running request, polled by clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse state of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// Whether the task has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Current status of a tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: Uuid,
    pub state: TaskState,
    /// Human-readable progress line.
    pub message: Option<String>,
    /// Result payload once completed.
    pub result: Option<serde_json::Value>,
    /// Error description once failed.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStatus {
    /// A new pending task.
    pub fn pending(id: Uuid, message: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            state: TaskState::Pending,
            message,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
