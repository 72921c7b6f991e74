//! Recording document store with fault injection.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::{DocumentContent, DocumentStore, FileMeta, FileUpload};
use docflow_core::types::ExternalId;
use docflow_eds::MemoryDocumentStore;

/// How an intercepted call misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a transient store error.
    Transient,
    /// Succeed without reporting an id.
    NoId,
}

#[derive(Debug, Clone)]
struct Rule {
    method: &'static str,
    /// 1-based call number to fail on; 0 fails every call.
    nth: usize,
    fault: Fault,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub args: Vec<String>,
}

/// Wraps [`MemoryDocumentStore`], recording every call.
#[derive(Debug)]
pub struct RecordingStore {
    pub inner: Arc<MemoryDocumentStore>,
    calls: Mutex<Vec<Call>>,
    rules: Mutex<Vec<Rule>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<MemoryDocumentStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call to `method`.
    pub fn fail_on(&self, method: &'static str, fault: Fault) {
        self.fail_on_nth(method, 0, fault);
    }

    /// Fail the `nth` call (1-based, counted from now) to `method`.
    pub fn fail_on_nth(&self, method: &'static str, nth: usize, fault: Fault) {
        let already = self.count(method);
        self.rules.lock().unwrap().push(Rule {
            method,
            nth: if nth == 0 { 0 } else { already + nth },
            fault,
        });
    }

    pub fn clear_faults(&self) {
        self.rules.lock().unwrap().clear();
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.rules.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of every call to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.args.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: &'static str, args: Vec<String>) -> Option<Fault> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call { method, args });
        let n = calls.iter().filter(|c| c.method == method).count();
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.method == method && (r.nth == 0 || r.nth == n))
            .map(|r| r.fault)
    }

    // Every call yields once so concurrent flows interleave at store
    // calls the way they do against a remote store.
    async fn intercept(&self, method: &'static str, args: Vec<String>) -> AppResult<()> {
        tokio::task::yield_now().await;
        match self.record(method, args) {
            Some(_) => Err(AppError::eds_transient(format!("injected failure in {method}"))),
            None => Ok(()),
        }
    }

    /// `Ok(true)` when the call should report no id.
    async fn intercept_id(&self, method: &'static str, args: Vec<String>) -> AppResult<bool> {
        tokio::task::yield_now().await;
        match self.record(method, args) {
            Some(Fault::Transient) => Err(AppError::eds_transient(format!(
                "injected failure in {method}"
            ))),
            Some(Fault::NoId) => Ok(true),
            None => Ok(false),
        }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    fn provider_type(&self) -> &str {
        "recording"
    }

    async fn copy_file(
        &self,
        template_id: &ExternalId,
        dest_folder_id: &ExternalId,
        new_name: &str,
    ) -> AppResult<Option<ExternalId>> {
        let args = vec![template_id.to_string(), dest_folder_id.to_string(), new_name.into()];
        if self.intercept_id("copy_file", args).await? {
            return Ok(None);
        }
        self.inner.copy_file(template_id, dest_folder_id, new_name).await
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_ids: &[ExternalId],
    ) -> AppResult<Option<ExternalId>> {
        let mut args = vec![name.to_string()];
        args.extend(parent_ids.iter().map(ToString::to_string));
        if self.intercept_id("create_folder", args).await? {
            return Ok(None);
        }
        self.inner.create_folder(name, parent_ids).await
    }

    async fn move_file(&self, file_id: &ExternalId, new_parent_id: &ExternalId) -> AppResult<()> {
        self.intercept("move_file", vec![file_id.to_string(), new_parent_id.to_string()]).await?;
        self.inner.move_file(file_id, new_parent_id).await
    }

    async fn trash(&self, id: &ExternalId) -> AppResult<()> {
        self.intercept("trash", vec![id.to_string()]).await?;
        self.inner.trash(id).await
    }

    async fn get_file_metadata(&self, id: &ExternalId) -> AppResult<FileMeta> {
        self.intercept("get_file_metadata", vec![id.to_string()]).await?;
        self.inner.get_file_metadata(id).await
    }

    async fn update_file_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        self.intercept("update_file_metadata", vec![id.to_string(), name.into()]).await?;
        self.inner.update_file_metadata(id, name).await
    }

    async fn update_folder_metadata(&self, id: &ExternalId, name: &str) -> AppResult<()> {
        self.intercept("update_folder_metadata", vec![id.to_string(), name.into()]).await?;
        self.inner.update_folder_metadata(id, name).await
    }

    async fn upload_file(
        &self,
        upload: &FileUpload,
        parent_folder_id: &ExternalId,
    ) -> AppResult<Option<ExternalId>> {
        let args = vec![upload.name.clone(), parent_folder_id.to_string()];
        if self.intercept_id("upload_file", args).await? {
            return Ok(None);
        }
        self.inner.upload_file(upload, parent_folder_id).await
    }

    async fn create_permissions(&self, file_id: &ExternalId) -> AppResult<()> {
        self.intercept("create_permissions", vec![file_id.to_string()]).await?;
        self.inner.create_permissions(file_id).await
    }

    async fn get_document(&self, document_id: &ExternalId) -> AppResult<DocumentContent> {
        self.intercept("get_document", vec![document_id.to_string()]).await?;
        self.inner.get_document(document_id).await
    }

    async fn create_named_ranges_from_tags(&self, document_id: &ExternalId) -> AppResult<()> {
        self.intercept("create_named_ranges_from_tags", vec![document_id.to_string()]).await?;
        self.inner.create_named_ranges_from_tags(document_id).await
    }

    async fn clear_named_ranges(&self, document_id: &ExternalId) -> AppResult<()> {
        self.intercept("clear_named_ranges", vec![document_id.to_string()]).await?;
        self.inner.clear_named_ranges(document_id).await
    }

    async fn fill_named_range(
        &self,
        document_id: &ExternalId,
        range_name: &str,
        text: &str,
    ) -> AppResult<()> {
        let args = vec![document_id.to_string(), range_name.into(), text.into()];
        self.intercept("fill_named_range", args).await?;
        self.inner.fill_named_range(document_id, range_name, text).await
    }
}
