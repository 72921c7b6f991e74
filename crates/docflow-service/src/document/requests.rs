//! Inputs of the document service operations.

use chrono::NaiveDate;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::FileUpload;
use docflow_core::types::{CaseId, EntityId, OfferId, ProjectId};
use docflow_entity::event::EventType;

/// Data for registering a new document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    /// Authored by the organisation (`true`) or received (`false`).
    pub is_outgoing: bool,
    /// Project parent; exactly one of project and offer.
    pub project_id: Option<ProjectId>,
    /// Offer parent.
    pub offer_id: Option<OfferId>,
    /// Number printed on a received document. Outgoing documents take
    /// their id as number and must leave this empty.
    pub number: Option<String>,
    pub description: String,
    pub creation_date: NaiveDate,
    pub registration_date: Option<NaiveDate>,
    pub case_ids: Vec<CaseId>,
    pub main_recipient_ids: Vec<EntityId>,
    pub cc_recipient_ids: Vec<EntityId>,
    /// Files to store with the document.
    pub attachments: Vec<FileUpload>,
}

impl CreateDocumentRequest {
    /// Check the request shape before anything is loaded or written.
    pub fn validate(&self) -> AppResult<()> {
        match (self.project_id, self.offer_id) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(AppError::validation(
                    "Exactly one of project_id and offer_id must be set",
                ));
            }
        }
        if self.description.trim().is_empty() {
            return Err(AppError::validation("Description must not be blank"));
        }
        if self.is_outgoing {
            if self.number.is_some() {
                return Err(AppError::validation(
                    "Outgoing documents are numbered automatically",
                ));
            }
            if self.case_ids.is_empty() {
                return Err(AppError::validation(
                    "Outgoing documents require at least one case",
                ));
            }
        } else if self.attachments.is_empty() {
            return Err(AppError::validation(
                "Incoming documents require at least one attachment",
            ));
        }
        Ok(())
    }
}

/// Changes to an existing document. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentRequest {
    /// New number; incoming documents only.
    pub number: Option<String>,
    pub description: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub registration_date: Option<NaiveDate>,
    pub case_ids: Option<Vec<CaseId>>,
    pub main_recipient_ids: Option<Vec<EntityId>>,
    pub cc_recipient_ids: Option<Vec<EntityId>>,
}

impl UpdateDocumentRequest {
    /// Whether the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.description.is_none()
            && self.creation_date.is_none()
            && self.registration_date.is_none()
            && self.case_ids.is_none()
            && self.main_recipient_ids.is_none()
            && self.cc_recipient_ids.is_none()
    }
}

/// Data for a lifecycle event.
#[derive(Debug, Clone)]
pub struct AppendEventRequest {
    pub event_type: EventType,
    pub comment: Option<String>,
    pub additional_message: Option<String>,
    /// Recipients to snapshot; versioned events default to the
    /// document's main and cc recipients.
    pub recipient_ids: Option<Vec<EntityId>>,
}

impl AppendEventRequest {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            comment: None,
            additional_message: None,
            recipient_ids: None,
        }
    }
}
