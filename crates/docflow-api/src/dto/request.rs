//! Request DTOs with validation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::FileUpload;
use docflow_core::types::{CaseId, EntityId, FilterGroup, OfferId, ProjectId};
use docflow_entity::event::EventType;
use docflow_service::{AppendEventRequest, CreateDocumentRequest, UpdateDocumentRequest};

/// Check a request body against its validation rules.
pub fn validate_body<T: Validate>(body: &T) -> AppResult<()> {
    body.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// A file sent inline with a request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachmentBody {
    /// File name with extension.
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub name: String,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// Base64-encoded content.
    pub content_base64: String,
}

impl AttachmentBody {
    /// Decodes the content into an upload.
    pub fn into_upload(self) -> AppResult<FileUpload> {
        let data = STANDARD.decode(self.content_base64.as_bytes()).map_err(|e| {
            AppError::validation(format!("Attachment {} is not valid base64: {e}", self.name))
        })?;
        Ok(FileUpload::new(self.name, self.mime_type, Bytes::from(data)))
    }
}

fn into_uploads(files: Vec<AttachmentBody>) -> AppResult<Vec<FileUpload>> {
    files.into_iter().map(AttachmentBody::into_upload).collect()
}

/// Create document request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocumentBody {
    /// Authored by the organisation (`true`) or received (`false`).
    pub is_outgoing: bool,
    pub project_id: Option<ProjectId>,
    pub offer_id: Option<OfferId>,
    /// Number of a received document.
    pub number: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub creation_date: NaiveDate,
    pub registration_date: Option<NaiveDate>,
    #[serde(default)]
    pub case_ids: Vec<CaseId>,
    #[serde(default)]
    pub main_recipient_ids: Vec<EntityId>,
    #[serde(default)]
    pub cc_recipient_ids: Vec<EntityId>,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentBody>,
}

impl CreateDocumentBody {
    /// Converts to the service request, decoding attachments.
    pub fn into_request(self) -> AppResult<CreateDocumentRequest> {
        Ok(CreateDocumentRequest {
            is_outgoing: self.is_outgoing,
            project_id: self.project_id,
            offer_id: self.offer_id,
            number: self.number,
            description: self.description,
            creation_date: self.creation_date,
            registration_date: self.registration_date,
            case_ids: self.case_ids,
            main_recipient_ids: self.main_recipient_ids,
            cc_recipient_ids: self.cc_recipient_ids,
            attachments: into_uploads(self.attachments)?,
        })
    }
}

/// Update document request. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDocumentBody {
    #[validate(length(min = 1, message = "Number must not be empty"))]
    pub number: Option<String>,
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub registration_date: Option<NaiveDate>,
    pub case_ids: Option<Vec<CaseId>>,
    pub main_recipient_ids: Option<Vec<EntityId>>,
    pub cc_recipient_ids: Option<Vec<EntityId>>,
}

impl From<UpdateDocumentBody> for UpdateDocumentRequest {
    fn from(body: UpdateDocumentBody) -> Self {
        Self {
            number: body.number,
            description: body.description,
            creation_date: body.creation_date,
            registration_date: body.registration_date,
            case_ids: body.case_ids,
            main_recipient_ids: body.main_recipient_ids,
            cc_recipient_ids: body.cc_recipient_ids,
        }
    }
}

/// Files to append to or replace a document's content.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachmentsBody {
    #[validate(length(min = 1, message = "At least one file is required"), nested)]
    pub files: Vec<AttachmentBody>,
}

impl AttachmentsBody {
    /// Decodes every file.
    pub fn into_uploads(self) -> AppResult<Vec<FileUpload>> {
        into_uploads(self.files)
    }
}

/// Append event request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppendEventBody {
    pub event_type: EventType,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[validate(length(max = 2000))]
    pub additional_message: Option<String>,
    /// Recipients to snapshot instead of the document's own.
    pub recipient_ids: Option<Vec<EntityId>>,
}

impl From<AppendEventBody> for AppendEventRequest {
    fn from(body: AppendEventBody) -> Self {
        Self {
            event_type: body.event_type,
            comment: body.comment,
            additional_message: body.additional_message,
            recipient_ids: body.recipient_ids,
        }
    }
}

/// Document search: groups are OR-ed, conditions inside a group AND-ed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}
