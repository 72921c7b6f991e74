//! Document row, loaded record, and domain aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use docflow_core::types::{DocumentId, EventId, OfferId, PersonId, ProjectId};

use super::content::ContentLocation;
use super::status::DocumentStatus;
use super::variant::{DocumentVariant, VariantTag};
use crate::event::DocumentEvent;
use crate::reference::{CaseRef, OfferRef, ProjectRef, Recipient};

/// A row of the `documents` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    /// Row id.
    pub id: DocumentId,
    /// Direction.
    pub is_outgoing: bool,
    /// Document number (equals `id` for current outgoing rows).
    pub number: Option<String>,
    /// Subject line.
    pub description: String,
    /// Date written on the document.
    pub creation_date: NaiveDate,
    /// Date the document was registered (incoming).
    pub registration_date: Option<NaiveDate>,
    /// Single-file content id.
    pub document_id: Option<String>,
    /// Multi-file content folder id.
    pub folder_id: Option<String>,
    /// Files inside `folder_id`.
    pub attachment_count: Option<i32>,
    /// Projected lifecycle status.
    pub status: DocumentStatus,
    /// Project parent.
    pub project_id: Option<ProjectId>,
    /// Offer parent.
    pub offer_id: Option<OfferId>,
    /// Template used for the generated body.
    pub template_id: Option<String>,
    /// Generated body id.
    pub generated_document_id: Option<String>,
    /// Person who last edited the row.
    pub editor_id: Option<PersonId>,
    /// Cached id of the latest ledger event.
    pub last_event_id: Option<EventId>,
    /// Last modification time.
    pub last_updated: DateTime<Utc>,
}

/// The attributes variant resolution looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionAttributes {
    /// Direction.
    pub is_outgoing: bool,
    /// Project parent id.
    pub project_id: Option<ProjectId>,
    /// Offer parent id.
    pub offer_id: Option<OfferId>,
    /// Row id, absent for new records.
    pub id: Option<DocumentId>,
    /// Stored number.
    pub number: Option<String>,
}

impl fmt::Display for ResolutionAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        }
        write!(
            f,
            "is_outgoing={}, project_id={}, offer_id={}, id={}, number={}",
            self.is_outgoing,
            show(&self.project_id),
            show(&self.offer_id),
            show(&self.id),
            show(&self.number),
        )
    }
}

/// A document row with its associations loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// The row itself.
    pub row: DocumentRow,
    /// Parent project, when `project_id` is set.
    pub project: Option<ProjectRef>,
    /// Parent offer, when `offer_id` is set.
    pub offer: Option<OfferRef>,
    /// Cases the document concerns.
    pub cases: Vec<CaseRef>,
    /// Main recipients.
    pub main_recipients: Vec<Recipient>,
    /// Carbon-copy recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Latest ledger event.
    pub last_event: Option<DocumentEvent>,
}

impl DocumentRecord {
    /// Attributes inspected by variant resolution.
    pub fn attributes(&self) -> ResolutionAttributes {
        ResolutionAttributes {
            is_outgoing: self.row.is_outgoing,
            project_id: self.project.as_ref().map(|p| p.id).or(self.row.project_id),
            offer_id: self.offer.as_ref().map(|o| o.id).or(self.row.offer_id),
            id: Some(self.row.id),
            number: self.row.number.clone(),
        }
    }
}

/// Data required to insert a new document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    /// Number; `None` for outgoing rows, which take their id.
    pub number: Option<String>,
    /// Subject line.
    pub description: String,
    /// Date written on the document.
    pub creation_date: NaiveDate,
    /// Registration date (incoming).
    pub registration_date: Option<NaiveDate>,
    /// Content, if already materialized.
    pub content: ContentLocation,
    /// Variant and payload.
    pub variant: DocumentVariant,
    /// Cases.
    pub cases: Vec<CaseRef>,
    /// Main recipients.
    pub main_recipients: Vec<Recipient>,
    /// Carbon-copy recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Creating person.
    pub editor_id: Option<PersonId>,
}

/// A resolved document aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Row id.
    pub id: DocumentId,
    /// Document number.
    pub number: Option<String>,
    /// Subject line.
    pub description: String,
    /// Date written on the document.
    pub creation_date: NaiveDate,
    /// Registration date (incoming).
    pub registration_date: Option<NaiveDate>,
    /// Where the content lives.
    pub content: ContentLocation,
    /// Projected lifecycle status.
    pub status: DocumentStatus,
    /// Variant and payload.
    pub variant: DocumentVariant,
    /// Cases.
    pub cases: Vec<CaseRef>,
    /// Main recipients.
    pub main_recipients: Vec<Recipient>,
    /// Carbon-copy recipients.
    pub cc_recipients: Vec<Recipient>,
    /// Last editing person.
    pub editor_id: Option<PersonId>,
    /// Latest ledger event.
    pub last_event: Option<DocumentEvent>,
    /// Last modification time.
    pub last_updated: DateTime<Utc>,
}

impl Document {
    /// Build the aggregate for a freshly inserted row.
    pub fn from_new(id: DocumentId, new: NewDocument, now: DateTime<Utc>) -> Self {
        let number = if new.variant.tag().is_outgoing() {
            new.number.or_else(|| Some(id.to_string()))
        } else {
            new.number
        };
        Self {
            id,
            number,
            description: new.description,
            creation_date: new.creation_date,
            registration_date: new.registration_date,
            content: new.content,
            status: DocumentStatus::Created,
            variant: new.variant,
            cases: new.cases,
            main_recipients: new.main_recipients,
            cc_recipients: new.cc_recipients,
            editor_id: new.editor_id,
            last_event: None,
            last_updated: now,
        }
    }

    /// Variant tag.
    pub fn tag(&self) -> VariantTag {
        self.variant.tag()
    }

    /// Direction.
    pub fn is_outgoing(&self) -> bool {
        self.tag().is_outgoing()
    }

    /// Status projected from the latest ledger event, `None` before the
    /// first event.
    ///
    /// A row without events whose stored status is past `Created` is a
    /// historical record: its stored status is used, so it can never be
    /// opened with a second CREATED event.
    pub fn current_status(&self) -> Option<DocumentStatus> {
        match &self.last_event {
            Some(event) => Some(DocumentStatus::after(event.event_type)),
            None if self.status == DocumentStatus::Created => None,
            None => Some(self.status),
        }
    }

    /// Number used in names and generated fields; falls back to the id.
    pub fn display_number(&self) -> String {
        self.number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(String::from)
            .unwrap_or_else(|| self.id.to_string())
    }
}
