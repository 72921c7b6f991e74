//! External document store capability surface.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::ExternalId;

/// MIME type the store uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata about a stored file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Store id.
    pub id: ExternalId,
    /// Display name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
}

impl FileMeta {
    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name (with extension).
    pub name: String,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

impl FileUpload {
    /// Create an upload descriptor.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type,
            data,
        }
    }
}

/// A named, substitutable range inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    /// Range name (the tag's inner name).
    pub name: String,
    /// Store-assigned range id.
    pub range_id: String,
}

/// Structural view of a generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// Named ranges currently defined.
    pub named_ranges: Vec<NamedRange>,
    /// Plain text of the body.
    pub body_text: String,
}

impl DocumentContent {
    /// Whether a range with this name exists.
    pub fn has_range(&self, name: &str) -> bool {
        self.named_ranges.iter().any(|r| r.name == name)
    }
}

/// Trait for external document store backends.
///
/// The store is remote and non-transactional: every call is a suspension
/// point that may fail independently, and no call can be cancelled once
/// issued. Operations that mint an artifact return `Option<ExternalId>`
/// exactly as the store reported it; callers decide whether an absent id
/// is fatal.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "http", "memory").
    fn provider_type(&self) -> &str;

    /// Copy a file (usually a template) into a folder under a new name.
    async fn copy_file(
        &self,
        template_id: &ExternalId,
        dest_folder_id: &ExternalId,
        new_name: &str,
    ) -> AppResult<Option<ExternalId>>;

    /// Create a folder under the given parents.
    async fn create_folder(
        &self,
        name: &str,
        parent_ids: &[ExternalId],
    ) -> AppResult<Option<ExternalId>>;

    /// Move a file into a new parent, keeping its id.
    async fn move_file(&self, file_id: &ExternalId, new_parent_id: &ExternalId) -> AppResult<()>;

    /// Move a file or folder to the trash.
    async fn trash(&self, id: &ExternalId) -> AppResult<()>;

    /// Read file or folder metadata.
    async fn get_file_metadata(&self, id: &ExternalId) -> AppResult<FileMeta>;

    /// Rename a file.
    async fn update_file_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()>;

    /// Rename a folder.
    async fn update_folder_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()>;

    /// Upload a file into a folder.
    async fn upload_file(
        &self,
        upload: &FileUpload,
        parent_folder_id: &ExternalId,
    ) -> AppResult<Option<ExternalId>>;

    /// Apply the fixed sharing policy to a file.
    async fn create_permissions(&self, file_id: &ExternalId) -> AppResult<()>;

    /// Read a document's named ranges and body text.
    async fn get_document(&self, document_id: &ExternalId) -> AppResult<DocumentContent>;

    /// Turn every tag marker whose name has no named range yet into one.
    /// Markers of an already ranged name are left alone.
    async fn create_named_ranges_from_tags(&self, document_id: &ExternalId) -> AppResult<()>;

    /// Remove every named range from the document.
    async fn clear_named_ranges(&self, document_id: &ExternalId) -> AppResult<()>;

    /// Replace the text of a named range.
    async fn fill_named_range(
        &self,
        document_id: &ExternalId,
        range_name: &str,
        text: &str,
    ) -> AppResult<()>;
}
