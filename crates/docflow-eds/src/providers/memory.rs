//! In-process document store for local development and tests.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::document_store::FOLDER_MIME_TYPE;
use docflow_core::traits::{DocumentContent, DocumentStore, FileMeta, FileUpload, NamedRange};
use docflow_core::types::{ExternalId, find_tags};

const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

#[derive(Debug, Clone)]
struct MemoryRange {
    name: String,
    range_id: String,
    bytes: Range<usize>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    name: String,
    mime_type: String,
    parents: Vec<ExternalId>,
    trashed: bool,
    data: Bytes,
    body: String,
    ranges: Vec<MemoryRange>,
    permissions: u32,
}

impl MemoryEntry {
    fn new(name: &str, mime_type: &str, parents: Vec<ExternalId>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parents,
            trashed: false,
            data: Bytes::new(),
            body: String::new(),
            ranges: Vec::new(),
            permissions: 0,
        }
    }
}

/// A document store kept entirely in memory.
///
/// Named ranges are tracked as byte spans of the body text; filling a
/// range rewrites the body and shifts every range after it.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    entries: DashMap<ExternalId, MemoryEntry>,
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&self, prefix: &str) -> ExternalId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        ExternalId::new(format!("{prefix}-{n}"))
    }

    fn missing(id: &ExternalId) -> AppError {
        AppError::not_found(format!("No file or folder with id {id}"))
    }

    fn require_live(&self, id: &ExternalId) -> AppResult<()> {
        match self.entries.get(id) {
            Some(entry) if !entry.trashed => Ok(()),
            _ => Err(Self::missing(id)),
        }
    }

    /// Register a folder under a fixed id.
    pub fn insert_folder(&self, id: ExternalId, name: &str) {
        self.entries
            .insert(id, MemoryEntry::new(name, FOLDER_MIME_TYPE, Vec::new()));
    }

    /// Register a document (typically a template) under a fixed id.
    pub fn insert_document(&self, id: ExternalId, name: &str, body: &str) {
        let mut entry = MemoryEntry::new(name, DOCUMENT_MIME_TYPE, Vec::new());
        entry.body = body.to_string();
        self.entries.insert(id, entry);
    }

    /// Live (non-trashed) children of a folder.
    pub fn children(&self, folder_id: &ExternalId) -> Vec<FileMeta> {
        let mut children: Vec<FileMeta> = self
            .entries
            .iter()
            .filter(|e| !e.trashed && e.parents.contains(folder_id))
            .map(|e| FileMeta {
                id: e.key().clone(),
                name: e.name.clone(),
                mime_type: e.mime_type.clone(),
            })
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        children
    }

    /// Whether the entry exists and is in the trash.
    pub fn is_trashed(&self, id: &ExternalId) -> bool {
        self.entries.get(id).is_some_and(|e| e.trashed)
    }

    /// Current body text of a document.
    pub fn body(&self, id: &ExternalId) -> Option<String> {
        self.entries.get(id).map(|e| e.body.clone())
    }

    /// Number of permission grants applied to an entry.
    pub fn permission_count(&self, id: &ExternalId) -> u32 {
        self.entries.get(id).map(|e| e.permissions).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn copy_file(
        &self,
        template_id: &ExternalId,
        dest_folder_id: &ExternalId,
        new_name: &str,
    ) -> AppResult<Option<ExternalId>> {
        self.require_live(dest_folder_id)?;
        let mut copy = match self.entries.get(template_id) {
            Some(source) if !source.trashed => source.clone(),
            _ => return Err(Self::missing(template_id)),
        };
        copy.name = new_name.to_string();
        copy.parents = vec![dest_folder_id.clone()];
        copy.ranges.clear();
        copy.permissions = 0;

        let id = self.mint_id("doc");
        self.entries.insert(id.clone(), copy);
        debug!(template_id = %template_id, file_id = %id, "Copied file in memory");
        Ok(Some(id))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_ids: &[ExternalId],
    ) -> AppResult<Option<ExternalId>> {
        for parent in parent_ids {
            self.require_live(parent)?;
        }
        let id = self.mint_id("folder");
        self.entries.insert(
            id.clone(),
            MemoryEntry::new(name, FOLDER_MIME_TYPE, parent_ids.to_vec()),
        );
        Ok(Some(id))
    }

    async fn move_file(&self, file_id: &ExternalId, new_parent_id: &ExternalId) -> AppResult<()> {
        self.require_live(new_parent_id)?;
        let mut entry = self
            .entries
            .get_mut(file_id)
            .filter(|e| !e.trashed)
            .ok_or_else(|| Self::missing(file_id))?;
        entry.parents = vec![new_parent_id.clone()];
        Ok(())
    }

    async fn trash(&self, id: &ExternalId) -> AppResult<()> {
        let mut entry = self.entries.get_mut(id).ok_or_else(|| Self::missing(id))?;
        entry.trashed = true;
        Ok(())
    }

    async fn get_file_metadata(&self, id: &ExternalId) -> AppResult<FileMeta> {
        let entry = self.entries.get(id).ok_or_else(|| Self::missing(id))?;
        Ok(FileMeta {
            id: id.clone(),
            name: entry.name.clone(),
            mime_type: entry.mime_type.clone(),
        })
    }

    async fn update_file_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        let mut entry = self.entries.get_mut(id).ok_or_else(|| Self::missing(id))?;
        entry.name = name.to_string();
        Ok(())
    }

    async fn update_folder_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        let mut entry = self.entries.get_mut(id).ok_or_else(|| Self::missing(id))?;
        if entry.mime_type != FOLDER_MIME_TYPE {
            return Err(AppError::validation(format!("{id} is not a folder")));
        }
        entry.name = name.to_string();
        Ok(())
    }

    async fn upload_file(
        &self,
        upload: &FileUpload,
        parent_folder_id: &ExternalId,
    ) -> AppResult<Option<ExternalId>> {
        self.require_live(parent_folder_id)?;
        let mime_type = upload
            .mime_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let mut entry = MemoryEntry::new(&upload.name, mime_type, vec![parent_folder_id.clone()]);
        entry.data = upload.data.clone();

        let id = self.mint_id("file");
        self.entries.insert(id.clone(), entry);
        Ok(Some(id))
    }

    async fn create_permissions(&self, file_id: &ExternalId) -> AppResult<()> {
        let mut entry = self
            .entries
            .get_mut(file_id)
            .ok_or_else(|| Self::missing(file_id))?;
        entry.permissions += 1;
        Ok(())
    }

    async fn get_document(&self, document_id: &ExternalId) -> AppResult<DocumentContent> {
        let entry = self
            .entries
            .get(document_id)
            .ok_or_else(|| Self::missing(document_id))?;
        Ok(DocumentContent {
            named_ranges: entry
                .ranges
                .iter()
                .map(|r| NamedRange {
                    name: r.name.clone(),
                    range_id: r.range_id.clone(),
                })
                .collect(),
            body_text: entry.body.clone(),
        })
    }

    async fn create_named_ranges_from_tags(&self, document_id: &ExternalId) -> AppResult<()> {
        let tags = {
            let entry = self
                .entries
                .get(document_id)
                .ok_or_else(|| Self::missing(document_id))?;
            find_tags(&entry.body)
                .into_iter()
                .filter(|tag| !entry.ranges.iter().any(|r| r.name == tag.name))
                .collect::<Vec<_>>()
        };
        let ranges: Vec<MemoryRange> = tags
            .into_iter()
            .map(|tag| MemoryRange {
                name: tag.name,
                range_id: self.mint_id("range").0,
                bytes: tag.bytes,
            })
            .collect();

        let mut entry = self
            .entries
            .get_mut(document_id)
            .ok_or_else(|| Self::missing(document_id))?;
        entry.ranges.extend(ranges);
        Ok(())
    }

    async fn clear_named_ranges(&self, document_id: &ExternalId) -> AppResult<()> {
        let mut entry = self
            .entries
            .get_mut(document_id)
            .ok_or_else(|| Self::missing(document_id))?;
        entry.ranges.clear();
        Ok(())
    }

    async fn fill_named_range(
        &self,
        document_id: &ExternalId,
        range_name: &str,
        text: &str,
    ) -> AppResult<()> {
        let mut entry = self
            .entries
            .get_mut(document_id)
            .ok_or_else(|| Self::missing(document_id))?;

        if !entry.ranges.iter().any(|r| r.name == range_name) {
            return Err(AppError::not_found(format!(
                "Document {document_id} has no named range '{range_name}'"
            )));
        }

        // Rewrite from the back so earlier spans stay valid while editing.
        let mut targets: Vec<usize> = (0..entry.ranges.len())
            .filter(|&i| entry.ranges[i].name == range_name)
            .collect();
        targets.sort_by_key(|&i| std::cmp::Reverse(entry.ranges[i].bytes.start));

        for i in targets {
            let span = entry.ranges[i].bytes.clone();
            entry.body.replace_range(span.clone(), text);
            let delta = text.len() as isize - span.len() as isize;
            for range in entry.ranges.iter_mut() {
                if range.bytes.start >= span.end {
                    range.bytes.start = (range.bytes.start as isize + delta) as usize;
                    range.bytes.end = (range.bytes.end as isize + delta) as usize;
                }
            }
            entry.ranges[i].bytes = span.start..span.start + text.len();
        }
        Ok(())
    }
}
