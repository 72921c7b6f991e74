//! Template document engine for outgoing documents.
//!
//! The engine copies a template into a document folder, turns its
//! `#TAG#name#` markers into named ranges and fills them. Ranges are
//! re-validated before every fill: filling a stale range set fails
//! instead of writing somewhere unexpected.

use std::sync::Arc;

use tracing::{debug, info};

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::{DocumentContent, DocumentStore};
use docflow_core::types::{ExternalId, find_tags};

use super::fields::{FieldValue, TemplateField, validate_required};
use crate::compensation::CompensationScope;

/// Creates, fills and refreshes generated documents.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    store: Arc<dyn DocumentStore>,
}

impl TemplateEngine {
    /// Creates a new template engine.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Copy `template_id` into `folder_id` as `name`, share it and create
    /// its named ranges.
    pub async fn create(
        &self,
        scope: &mut CompensationScope,
        template_id: &ExternalId,
        folder_id: &ExternalId,
        name: &str,
    ) -> AppResult<ExternalId> {
        let document_id = self
            .store
            .copy_file(template_id, folder_id, name)
            .await?
            .ok_or_else(|| {
                AppError::missing_external_id(format!(
                    "Store returned no id for the copy of template {template_id}"
                ))
            })?;
        scope.record_trash(document_id.clone());

        self.store.create_permissions(&document_id).await?;
        self.store.create_named_ranges_from_tags(&document_id).await?;
        info!(
            document_id = %document_id,
            template_id = %template_id,
            folder_id = %folder_id,
            "Created document from template"
        );
        Ok(document_id)
    }

    /// Replace the text of every named range that has a field.
    ///
    /// Required fields are checked before the store is contacted.
    pub async fn fill(&self, document_id: &ExternalId, fields: &[FieldValue]) -> AppResult<()> {
        validate_required(fields)?;

        let content = self.store.get_document(document_id).await?;
        if content.named_ranges.is_empty() {
            return Err(AppError::corrupt_template(format!(
                "Document {document_id} has no named ranges"
            )));
        }
        let missing: Vec<&str> = TemplateField::REQUIRED
            .iter()
            .map(|f| f.range_name())
            .filter(|name| !content.has_range(name))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::corrupt_template(format!(
                "Document {document_id} lacks required ranges: {}",
                missing.join(", ")
            )));
        }

        for value in fields {
            let name = value.field.range_name();
            if !content.has_range(name) {
                debug!(document_id = %document_id, range = name, "Template has no range for optional field");
                continue;
            }
            self.store
                .fill_named_range(document_id, name, &value.text)
                .await?;
        }
        debug!(document_id = %document_id, fields = fields.len(), "Filled named ranges");
        Ok(())
    }

    /// Re-scan the document for tag markers and re-create ranges.
    ///
    /// A body tagged for every required field is treated as a fresh
    /// template: all ranges are cleared and rebuilt. Otherwise only tags
    /// whose name has no range yet get one, so ranged markers are never
    /// ranged twice. At least one range must exist afterwards.
    pub async fn refresh(&self, document_id: &ExternalId) -> AppResult<DocumentContent> {
        let content = self.store.get_document(document_id).await?;
        let tags = find_tags(&content.body_text);

        let fully_tagged = TemplateField::REQUIRED
            .iter()
            .all(|f| tags.iter().any(|t| t.name == f.range_name()));
        let untracked = tags.iter().any(|t| !content.has_range(&t.name));

        let content = if fully_tagged {
            self.store.clear_named_ranges(document_id).await?;
            self.store.create_named_ranges_from_tags(document_id).await?;
            debug!(document_id = %document_id, tags = tags.len(), "Rebuilt named ranges");
            self.store.get_document(document_id).await?
        } else if untracked {
            self.store.create_named_ranges_from_tags(document_id).await?;
            debug!(document_id = %document_id, "Added ranges for new tags");
            self.store.get_document(document_id).await?
        } else {
            content
        };

        if content.named_ranges.is_empty() {
            return Err(AppError::corrupt_template(format!(
                "Document {document_id} has no named ranges after refresh"
            )));
        }
        Ok(content)
    }
}
