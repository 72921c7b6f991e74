//! Persisted ledger events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use docflow_core::types::{DocumentId, EventId, PersonId};

use super::kind::EventType;
use super::snapshot::{AttachmentSnapshot, RecipientSnapshot};

/// An immutable row of the `document_events` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentEvent {
    pub id: EventId,
    pub document_id: DocumentId,
    pub event_type: EventType,
    pub editor_id: Option<PersonId>,
    pub comment: Option<String>,
    pub additional_message: Option<String>,
    /// Present only for versioned event types.
    pub version_number: Option<i32>,
    pub recipients: Json<Vec<RecipientSnapshot>>,
    pub attachments: Json<Vec<AttachmentSnapshot>>,
    /// Identifies the append attempt that wrote this row.
    pub attempt_id: Uuid,
    pub last_updated: DateTime<Utc>,
}

/// Data for one append attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub document_id: DocumentId,
    pub event_type: EventType,
    pub editor_id: Option<PersonId>,
    pub comment: Option<String>,
    pub additional_message: Option<String>,
    pub recipients: Vec<RecipientSnapshot>,
    pub attachments: Vec<AttachmentSnapshot>,
    pub attempt_id: Uuid,
}

impl NewEvent {
    /// The CREATED event that opens a document's ledger.
    pub fn created(document_id: DocumentId, editor_id: Option<PersonId>, attempt_id: Uuid) -> Self {
        Self {
            document_id,
            event_type: EventType::Created,
            editor_id,
            comment: None,
            additional_message: None,
            recipients: Vec::new(),
            attachments: Vec::new(),
            attempt_id,
        }
    }

    /// Materialize the row this attempt would persist. Versioned types
    /// are numbered by the repository at write time.
    pub fn into_event(
        self,
        id: EventId,
        version_number: Option<i32>,
        now: DateTime<Utc>,
    ) -> DocumentEvent {
        DocumentEvent {
            id,
            document_id: self.document_id,
            event_type: self.event_type,
            editor_id: self.editor_id,
            comment: self.comment,
            additional_message: self.additional_message,
            version_number,
            recipients: Json(self.recipients),
            attachments: Json(self.attachments),
            attempt_id: self.attempt_id,
            last_updated: now,
        }
    }
}
