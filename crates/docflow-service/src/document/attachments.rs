//! Attachment state machine.
//!
//! Content moves `Uninitialized -> SingleFile | MultiFile`,
//! `SingleFile -> MultiFile` (promotion) and `MultiFile -> MultiFile`.
//! There is no way back to `Uninitialized` or from a folder to a single
//! file; removing content means removing the document.

use std::sync::Arc;

use tracing::{debug, info, warn};

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::{DocumentStore, FileUpload};
use docflow_core::types::ExternalId;
use docflow_entity::document::ContentLocation;

use super::naming::with_extension;
use crate::compensation::CompensationScope;

/// New content that has not yet replaced the old one.
///
/// The caller persists [`Replacement::location`] first, then hands the
/// value back to [`AttachmentService::retire`] to trash the old content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "replaced content must be retired once the new location is persisted"]
pub struct Replacement {
    /// Freshly materialized content.
    pub location: ContentLocation,
    /// Content to trash once `location` is persisted.
    pub retired: ContentLocation,
}

/// Materializes, grows, replaces, renames and removes document content in
/// the external store.
#[derive(Debug, Clone)]
pub struct AttachmentService {
    store: Arc<dyn DocumentStore>,
}

impl AttachmentService {
    /// Creates a new attachment service.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Materialize the first content of a document.
    ///
    /// One upload goes straight into `parent` under `name` (keeping its
    /// extension); several go into a new folder called `name`.
    pub async fn initialize(
        &self,
        scope: &mut CompensationScope,
        parent: &ExternalId,
        name: &str,
        uploads: &[FileUpload],
    ) -> AppResult<ContentLocation> {
        match uploads {
            [] => Err(AppError::validation(
                "At least one attachment is required to initialize content",
            )),
            [single] => {
                let renamed = FileUpload::new(
                    with_extension(name, &single.name),
                    single.mime_type.clone(),
                    single.data.clone(),
                );
                let document_id = self.upload(scope, &renamed, parent).await?;
                info!(document_id = %document_id, parent_id = %parent, "Initialized single-file content");
                Ok(ContentLocation::SingleFile { document_id })
            }
            many => {
                let folder_id = self.create_folder(scope, name, parent).await?;
                for upload in many {
                    self.upload(scope, upload, &folder_id).await?;
                }
                info!(
                    folder_id = %folder_id,
                    files = many.len(),
                    "Initialized multi-file content"
                );
                Ok(ContentLocation::MultiFile {
                    folder_id,
                    attachment_count: many.len() as u32,
                })
            }
        }
    }

    /// Add files to existing content.
    ///
    /// A single file is promoted: a folder is created, the original file
    /// is moved (not copied) into it and the new files are uploaded next
    /// to it.
    pub async fn append(
        &self,
        scope: &mut CompensationScope,
        current: &ContentLocation,
        parent: &ExternalId,
        name: &str,
        uploads: &[FileUpload],
    ) -> AppResult<ContentLocation> {
        if uploads.is_empty() {
            return Ok(current.clone());
        }
        match current {
            ContentLocation::Uninitialized => {
                self.initialize(scope, parent, name, uploads).await
            }
            ContentLocation::SingleFile { document_id } => {
                let folder_id = self.create_folder(scope, name, parent).await?;
                self.store.move_file(document_id, &folder_id).await?;
                scope.record_move(document_id.clone(), parent.clone());
                debug!(file_id = %document_id, folder_id = %folder_id, "Moved original file into content folder");

                for upload in uploads {
                    self.upload(scope, upload, &folder_id).await?;
                }
                info!(
                    folder_id = %folder_id,
                    original = %document_id,
                    added = uploads.len(),
                    "Promoted single-file content"
                );
                Ok(ContentLocation::MultiFile {
                    folder_id,
                    attachment_count: 1 + uploads.len() as u32,
                })
            }
            ContentLocation::MultiFile {
                folder_id,
                attachment_count,
            } => {
                for upload in uploads {
                    self.upload(scope, upload, folder_id).await?;
                }
                debug!(folder_id = %folder_id, added = uploads.len(), "Appended to content folder");
                Ok(ContentLocation::MultiFile {
                    folder_id: folder_id.clone(),
                    attachment_count: attachment_count + uploads.len() as u32,
                })
            }
        }
    }

    /// Materialize replacement content. The old content is untouched
    /// until [`retire`](Self::retire).
    pub async fn replace(
        &self,
        scope: &mut CompensationScope,
        current: &ContentLocation,
        parent: &ExternalId,
        name: &str,
        uploads: &[FileUpload],
    ) -> AppResult<Replacement> {
        let location = self.initialize(scope, parent, name, uploads).await?;
        Ok(Replacement {
            location,
            retired: current.clone(),
        })
    }

    /// Trash the content a persisted replacement superseded.
    pub async fn retire(&self, replacement: Replacement) -> AppResult<ContentLocation> {
        self.teardown(&replacement.retired).await?;
        Ok(replacement.location)
    }

    /// Trash the folder if present, else the single file.
    pub async fn teardown(&self, location: &ContentLocation) -> AppResult<()> {
        match location {
            ContentLocation::MultiFile { folder_id, .. } => {
                self.store.trash(folder_id).await?;
                info!(folder_id = %folder_id, "Trashed content folder");
            }
            ContentLocation::SingleFile { document_id } => {
                self.store.trash(document_id).await?;
                info!(document_id = %document_id, "Trashed content file");
            }
            ContentLocation::Uninitialized => {
                let error = AppError::integrity_fault(
                    "Neither document_id nor folder_id is populated, nothing to trash",
                );
                warn!(error = %error, "Skipping content teardown");
            }
        }
        Ok(())
    }

    /// Rename whatever the content is. A single file keeps its extension.
    pub async fn rename_content(&self, location: &ContentLocation, name: &str) -> AppResult<bool> {
        match location {
            ContentLocation::SingleFile { document_id } => {
                self.rename_file(document_id, name, true).await
            }
            ContentLocation::MultiFile { folder_id, .. } => {
                self.rename_folder(folder_id, name).await
            }
            ContentLocation::Uninitialized => Ok(false),
        }
    }

    /// Rename a file unless it already has the target name.
    ///
    /// Returns whether an update was issued.
    pub async fn rename_file(
        &self,
        id: &ExternalId,
        name: &str,
        keep_extension: bool,
    ) -> AppResult<bool> {
        let current = self.store.get_file_metadata(id).await?;
        let target = if keep_extension {
            with_extension(name, &current.name)
        } else {
            name.to_string()
        };
        if current.name == target {
            debug!(file_id = %id, name = %target, "File already has target name");
            return Ok(false);
        }
        self.store.update_file_metadata(id, &target).await?;
        info!(file_id = %id, from = %current.name, to = %target, "Renamed file");
        Ok(true)
    }

    /// Rename a folder unless it already has the target name.
    pub async fn rename_folder(&self, id: &ExternalId, name: &str) -> AppResult<bool> {
        let current = self.store.get_file_metadata(id).await?;
        if current.name == name {
            debug!(folder_id = %id, name = %name, "Folder already has target name");
            return Ok(false);
        }
        self.store.update_folder_metadata(id, name).await?;
        info!(folder_id = %id, from = %current.name, to = %name, "Renamed folder");
        Ok(true)
    }

    /// Create a folder and record it for rollback.
    pub async fn create_folder(
        &self,
        scope: &mut CompensationScope,
        name: &str,
        parent: &ExternalId,
    ) -> AppResult<ExternalId> {
        let folder_id = self
            .store
            .create_folder(name, std::slice::from_ref(parent))
            .await?
            .ok_or_else(|| {
                AppError::missing_external_id(format!(
                    "Store returned no id for folder '{name}' under {parent}"
                ))
            })?;
        scope.record_trash(folder_id.clone());
        debug!(folder_id = %folder_id, parent_id = %parent, "Created content folder");
        Ok(folder_id)
    }

    async fn upload(
        &self,
        scope: &mut CompensationScope,
        upload: &FileUpload,
        parent: &ExternalId,
    ) -> AppResult<ExternalId> {
        let id = self
            .store
            .upload_file(upload, parent)
            .await?
            .ok_or_else(|| {
                AppError::missing_external_id(format!(
                    "Store returned no id for upload '{}' into {parent}",
                    upload.name
                ))
            })?;
        scope.record_trash(id.clone());
        debug!(file_id = %id, parent_id = %parent, name = %upload.name, "Uploaded file");
        Ok(id)
    }
}
