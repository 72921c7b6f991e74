//! Append-only per-document event ledger.
//!
//! Status is never written on its own: every append projects the new
//! status from the event type and stores both in one relational
//! transaction.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::types::{DocumentId, PersonId};
use docflow_database::repositories::EventRepository;
use docflow_entity::document::DocumentStatus;
use docflow_entity::event::{AttachmentSnapshot, DocumentEvent, EventType, NewEvent, RecipientSnapshot};

/// Input of a single append.
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub document_id: DocumentId,
    pub event_type: EventType,
    pub editor_id: Option<PersonId>,
    pub comment: Option<String>,
    pub additional_message: Option<String>,
    /// Frozen at append time.
    pub recipients: Vec<RecipientSnapshot>,
    /// Frozen at append time.
    pub attachments: Vec<AttachmentSnapshot>,
}

impl AppendEvent {
    /// An event with no comment and empty snapshots.
    pub fn new(document_id: DocumentId, event_type: EventType, editor_id: Option<PersonId>) -> Self {
        Self {
            document_id,
            event_type,
            editor_id,
            comment: None,
            additional_message: None,
            recipients: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// Status after appending `event` to a document currently in `current`.
///
/// `current` is `None` before the first event; only `Created` may start
/// a ledger.
pub fn transition(current: Option<DocumentStatus>, event: EventType) -> AppResult<DocumentStatus> {
    let allowed = match current {
        None => event == EventType::Created,
        Some(status) => status.accepts(event),
    };
    if allowed {
        Ok(DocumentStatus::after(event))
    } else {
        Err(AppError::conflict(format!(
            "Event {event} is not allowed in status {}",
            current.map(|s| s.as_str()).unwrap_or("NONE")
        )))
    }
}

/// Appends events and numbers versioned ones.
#[derive(Debug, Clone)]
pub struct EventLedger {
    events: Arc<dyn EventRepository>,
}

impl EventLedger {
    /// Creates a new event ledger.
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Append an event to a document whose status is `current`.
    ///
    /// Versioned types get `count(previous events of the same type) + 1`,
    /// assigned by the repository while the document row is locked. If
    /// persisting fails, anything the attempt wrote is deleted before the
    /// error is returned.
    pub async fn append(
        &self,
        current: Option<DocumentStatus>,
        request: AppendEvent,
    ) -> AppResult<DocumentEvent> {
        let status = transition(current, request.event_type)?;

        let attempt_id = Uuid::new_v4();
        let event = NewEvent {
            document_id: request.document_id,
            event_type: request.event_type,
            editor_id: request.editor_id,
            comment: request.comment,
            additional_message: request.additional_message,
            recipients: request.recipients,
            attachments: request.attachments,
            attempt_id,
        };

        match self.events.append(&event, status).await {
            Ok(stored) => {
                info!(
                    document_id = %stored.document_id,
                    event_id = %stored.id,
                    event_type = %stored.event_type,
                    version = ?stored.version_number,
                    status = %status,
                    "Appended document event"
                );
                Ok(stored)
            }
            Err(e) => {
                if let Err(cleanup) = self.events.delete_by_attempt(attempt_id).await {
                    warn!(
                        document_id = %event.document_id,
                        attempt_id = %attempt_id,
                        error = %cleanup,
                        "Failed to clean up partial event write"
                    );
                }
                Err(e)
            }
        }
    }

    /// Every event of a document, oldest first.
    pub async fn history(&self, document_id: DocumentId) -> AppResult<Vec<DocumentEvent>> {
        self.events.find_by_document(document_id).await
    }
}
