//! Document lifecycle orchestration.
//!
//! Every multi-step flow records its effects in a [`CompensationScope`]
//! and hands the scope to the [`CompensationCoordinator`] when a later
//! step fails. Relational rows and store artifacts are undone in reverse
//! order; the error returned to the caller is the original one unless
//! the rollback itself failed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use docflow_core::config::DocumentsConfig;
use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::traits::{DocumentStore, FileUpload};
use docflow_core::types::{
    CaseId, DocumentId, EntityId, ExternalId, FilterGroup, PageRequest, PageResponse,
};
use docflow_database::repositories::{DocumentRepository, EventRepository, ReferenceRepository};
use docflow_entity::document::{
    ContentLocation, Document, GeneratedDocument, NewDocument, ResolutionAttributes, VariantTag,
};
use docflow_entity::event::{AttachmentSnapshot, DocumentEvent, EventType, RecipientSnapshot};
use docflow_entity::reference::{CaseRef, ParentContext, Recipient};

use super::attachments::AttachmentService;
use super::fields::{FieldValue, derive_fields, validate_required};
use super::naming::{UNNUMBERED, content_label, content_name};
use super::requests::{AppendEventRequest, CreateDocumentRequest, UpdateDocumentRequest};
use super::resolver::{new_variant, resolve_document, resolve_variant};
use super::strategy::{VariantStrategy, strategy_for};
use super::template::TemplateEngine;
use crate::compensation::{CompensationCoordinator, CompensationScope};
use crate::context::RequestContext;
use crate::event::{AppendEvent, EventLedger, transition};
use crate::task::TaskTracker;

/// Associations loaded for a create or update.
struct Associations {
    cases: Vec<CaseRef>,
    main_recipients: Vec<Recipient>,
    cc_recipients: Vec<Recipient>,
}

/// Orchestrates the document lifecycle.
#[derive(Debug, Clone)]
pub struct DocumentService {
    /// Document rows.
    documents: Arc<dyn DocumentRepository>,
    /// Projects, offers, cases and recipients.
    references: Arc<dyn ReferenceRepository>,
    /// External document store.
    store: Arc<dyn DocumentStore>,
    /// Content state machine.
    attachments: AttachmentService,
    /// Generated documents.
    templates: TemplateEngine,
    /// Event ledger.
    ledger: EventLedger,
    /// Rollback of failed flows.
    compensation: CompensationCoordinator,
    /// Template ids and naming suffixes.
    config: DocumentsConfig,
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        events: Arc<dyn EventRepository>,
        references: Arc<dyn ReferenceRepository>,
        store: Arc<dyn DocumentStore>,
        config: DocumentsConfig,
    ) -> Self {
        Self {
            attachments: AttachmentService::new(store.clone()),
            templates: TemplateEngine::new(store.clone()),
            ledger: EventLedger::new(events),
            compensation: CompensationCoordinator::new(store.clone(), documents.clone()),
            documents,
            references,
            store,
            config,
        }
    }

    /// Provider type of the external document store.
    pub fn store_provider(&self) -> &str {
        self.store.provider_type()
    }

    /// Load and resolve a document.
    pub async fn get(&self, id: DocumentId) -> AppResult<Document> {
        let record = self
            .documents
            .find_record(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        resolve_document(record)
    }

    /// Register a new document and append its CREATED event.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateDocumentRequest,
    ) -> AppResult<Document> {
        self.create_with_progress(ctx, request, &|_: &str| {}).await
    }

    /// [`create`](Self::create), reporting progress on a tracked task.
    ///
    /// The task is completed with the document or failed with the error.
    pub async fn create_tracked(
        &self,
        ctx: &RequestContext,
        request: CreateDocumentRequest,
        tracker: &TaskTracker,
        task_id: Uuid,
    ) -> AppResult<Document> {
        let report = |message: &str| {
            tracker.update(task_id, message);
        };
        match self.create_with_progress(ctx, request, &report).await {
            Ok(document) => match serde_json::to_value(&document) {
                Ok(payload) => {
                    tracker.complete(task_id, payload);
                    Ok(document)
                }
                Err(e) => {
                    tracker.fail(task_id, e.to_string());
                    Err(e.into())
                }
            },
            Err(e) => {
                tracker.fail(task_id, e.to_string());
                Err(e)
            }
        }
    }

    async fn create_with_progress(
        &self,
        ctx: &RequestContext,
        request: CreateDocumentRequest,
        report: &(dyn Fn(&str) + Send + Sync),
    ) -> AppResult<Document> {
        request.validate()?;

        let tag = resolve_variant(&ResolutionAttributes {
            is_outgoing: request.is_outgoing,
            project_id: request.project_id,
            offer_id: request.offer_id,
            id: None,
            number: request.number.clone(),
        })?;
        let strategy = strategy_for(tag);
        let template_id = if tag.is_outgoing() {
            let id = strategy.template_id(&self.config).ok_or_else(|| {
                AppError::configuration(format!("No template configured for {tag} documents"))
            })?;
            Some(ExternalId::new(id))
        } else {
            None
        };

        report("Loading references");
        let parent = self.load_parent(&request).await?;
        let associations = self
            .load_associations(
                &request.case_ids,
                &request.main_recipient_ids,
                &request.cc_recipient_ids,
            )
            .await?;

        let new = NewDocument {
            number: request.number.clone(),
            description: request.description.trim().to_string(),
            creation_date: request.creation_date,
            registration_date: request.registration_date,
            content: ContentLocation::Uninitialized,
            variant: new_variant(tag, parent, template_id.clone())?,
            cases: associations.cases,
            main_recipients: associations.main_recipients,
            cc_recipients: associations.cc_recipients,
            editor_id: ctx.editor_id,
        };

        let mut scope = CompensationScope::new();
        let created = match template_id {
            Some(template_id) => {
                self.create_outgoing(
                    &mut scope,
                    new,
                    strategy,
                    &template_id,
                    &request.attachments,
                    report,
                )
                .await
            }
            None => {
                self.create_incoming(&mut scope, new, strategy, &request.attachments, report)
                    .await
            }
        };
        let (mut document, event) = match created {
            Ok(created) => created,
            Err(e) => return Err(self.compensation.compensate(scope, e).await),
        };
        document.status = transition(None, event.event_type)?;
        document.last_event = Some(event);

        info!(
            document_id = %document.id,
            variant = %tag,
            number = %document.display_number(),
            content = ?document.content.state(),
            "Document created"
        );
        Ok(document)
    }

    /// Outgoing flow: row, folder, generated document, attachments, then
    /// the content columns and the CREATED event in one transaction.
    async fn create_outgoing(
        &self,
        scope: &mut CompensationScope,
        new: NewDocument,
        strategy: &dyn VariantStrategy,
        template_id: &ExternalId,
        uploads: &[FileUpload],
        report: &(dyn Fn(&str) + Send + Sync),
    ) -> AppResult<(Document, DocumentEvent)> {
        report("Registering document");
        let id = self.documents.insert(&new).await?;
        scope.record_row(id);
        let mut document = Document::from_new(id, new, Utc::now());

        let fields = derive_fields(&document, strategy.context_label(&document));
        validate_required(&fields)?;
        let name = self.content_name(&document, strategy);
        let parent_folder = document.variant.parent_folder_id().clone();

        report("Creating document folder");
        let folder_id = self
            .attachments
            .create_folder(scope, &name, &parent_folder)
            .await?;

        report("Copying template");
        let generated_id = self
            .templates
            .create(scope, template_id, &folder_id, &name)
            .await?;
        report("Filling template");
        self.templates.fill(&generated_id, &fields).await?;

        let mut content = ContentLocation::MultiFile {
            folder_id,
            attachment_count: 1,
        };
        if !uploads.is_empty() {
            report("Uploading attachments");
            content = self
                .attachments
                .append(scope, &content, &parent_folder, &name, uploads)
                .await?;
        }

        let generated = GeneratedDocument {
            template_id: Some(template_id.clone()),
            document_id: Some(generated_id),
        };
        report("Recording creation");
        let event = self
            .documents
            .complete_creation(
                id,
                &content,
                Some(&generated),
                document.editor_id,
                Uuid::new_v4(),
            )
            .await?;
        document.content = content;
        if let Some(slot) = document.variant.generated_mut() {
            *slot = generated;
        }
        Ok((document, event))
    }

    /// Incoming flow: attachments first, then the row and its CREATED
    /// event in one transaction.
    async fn create_incoming(
        &self,
        scope: &mut CompensationScope,
        mut new: NewDocument,
        strategy: &dyn VariantStrategy,
        uploads: &[FileUpload],
        report: &(dyn Fn(&str) + Send + Sync),
    ) -> AppResult<(Document, DocumentEvent)> {
        let number = new.number.as_deref().unwrap_or(UNNUMBERED);
        let name = content_name(
            &content_label(number, new.creation_date),
            strategy.suffix(&self.config),
        );
        let parent_folder = new.variant.parent_folder_id().clone();

        report("Uploading attachments");
        new.content = self
            .attachments
            .initialize(scope, &parent_folder, &name, uploads)
            .await?;

        report("Registering document");
        let (id, event) = self.documents.insert_created(&new, Uuid::new_v4()).await?;
        Ok((Document::from_new(id, new, Utc::now()), event))
    }

    /// Apply edits, re-materialize derived content and append CHANGED.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        request: UpdateDocumentRequest,
    ) -> AppResult<Document> {
        let mut document = self.get(id).await?;
        Self::ensure_editable(&document)?;
        if request.is_empty() {
            return Err(AppError::validation("Update request changes nothing"));
        }
        let current = document.current_status();
        let status = transition(current, EventType::Changed)?;

        let strategy = strategy_for(document.tag());
        let before = document
            .is_outgoing()
            .then(|| derive_fields(&document, strategy.context_label(&document)));

        self.apply_changes(&mut document, request).await?;
        document.editor_id = ctx.editor_id.or(document.editor_id);

        let after = document
            .is_outgoing()
            .then(|| derive_fields(&document, strategy.context_label(&document)));
        if let Some(fields) = &after {
            validate_required(fields)?;
        }

        let name = self.content_name(&document, strategy);
        self.attachments
            .rename_content(&document.content, &name)
            .await?;

        if let (Some(before), Some(after)) = (before, after) {
            let generated_id = document
                .variant
                .generated()
                .and_then(|g| g.document_id.clone());
            match generated_id {
                Some(generated_id) => {
                    self.attachments
                        .rename_file(&generated_id, &name, false)
                        .await?;
                    if before != after {
                        self.refill(&generated_id, &after).await?;
                    }
                }
                None => warn!(document_id = %id, "Outgoing document has no generated document"),
            }
        }

        self.documents.update_details(&document).await?;

        let event = self
            .ledger
            .append(current, AppendEvent::new(id, EventType::Changed, ctx.editor_id))
            .await?;
        document.status = status;
        document.last_event = Some(event);
        info!(document_id = %id, "Document updated");
        Ok(document)
    }

    async fn refill(&self, generated_id: &ExternalId, fields: &[FieldValue]) -> AppResult<()> {
        self.templates.refresh(generated_id).await?;
        self.templates.fill(generated_id, fields).await
    }

    async fn apply_changes(
        &self,
        document: &mut Document,
        request: UpdateDocumentRequest,
    ) -> AppResult<()> {
        if let Some(number) = request.number {
            if document.is_outgoing() {
                if Some(number.trim()) != document.number.as_deref() {
                    return Err(AppError::validation(
                        "Outgoing document numbers cannot be changed",
                    ));
                }
            } else {
                document.number = Some(number.trim().to_string()).filter(|n| !n.is_empty());
            }
        }
        if let Some(description) = request.description {
            if description.trim().is_empty() {
                return Err(AppError::validation("Description must not be blank"));
            }
            document.description = description.trim().to_string();
        }
        if let Some(date) = request.creation_date {
            document.creation_date = date;
        }
        if let Some(date) = request.registration_date {
            document.registration_date = Some(date);
        }
        if let Some(case_ids) = request.case_ids {
            if document.is_outgoing() && case_ids.is_empty() {
                return Err(AppError::validation(
                    "Outgoing documents require at least one case",
                ));
            }
            document.cases = self.load_cases(&case_ids).await?;
        }
        if let Some(ids) = request.main_recipient_ids {
            document.main_recipients = self.load_recipients(&ids).await?;
        }
        if let Some(ids) = request.cc_recipient_ids {
            document.cc_recipients = self.load_recipients(&ids).await?;
        }
        Ok(())
    }

    /// Add files to a document's content, promoting a single file to a
    /// folder when needed.
    pub async fn append_attachments(
        &self,
        _ctx: &RequestContext,
        id: DocumentId,
        uploads: Vec<FileUpload>,
    ) -> AppResult<Document> {
        let mut document = self.get(id).await?;
        Self::ensure_editable(&document)?;
        if uploads.is_empty() {
            return Err(AppError::validation("No attachments given"));
        }

        let strategy = strategy_for(document.tag());
        let name = self.content_name(&document, strategy);
        let parent = document.variant.parent_folder_id().clone();

        let mut scope = CompensationScope::new();
        let appended = async {
            let content = self
                .attachments
                .append(&mut scope, &document.content, &parent, &name, &uploads)
                .await?;
            self.documents.update_content(id, &content, None).await?;
            Ok::<_, AppError>(content)
        }
        .await;
        match appended {
            Ok(content) => {
                info!(
                    document_id = %id,
                    added = uploads.len(),
                    files = content.file_count(),
                    "Attachments appended"
                );
                document.content = content;
                Ok(document)
            }
            Err(e) => Err(self.compensation.compensate(scope, e).await),
        }
    }

    /// Replace the content of an incoming document.
    ///
    /// New content is created and persisted before the old content is
    /// trashed, so the row always points at live content.
    pub async fn replace_attachments(
        &self,
        _ctx: &RequestContext,
        id: DocumentId,
        uploads: Vec<FileUpload>,
    ) -> AppResult<Document> {
        let mut document = self.get(id).await?;
        Self::ensure_editable(&document)?;
        if document.is_outgoing() {
            return Err(AppError::validation(
                "Generated content of outgoing documents cannot be replaced",
            ));
        }
        if uploads.is_empty() {
            return Err(AppError::validation("No attachments given"));
        }

        let strategy = strategy_for(document.tag());
        let name = self.content_name(&document, strategy);
        let parent = document.variant.parent_folder_id().clone();

        let mut scope = CompensationScope::new();
        let replaced = async {
            let replacement = self
                .attachments
                .replace(&mut scope, &document.content, &parent, &name, &uploads)
                .await?;
            self.documents
                .update_content(id, &replacement.location, None)
                .await?;
            Ok::<_, AppError>(replacement)
        }
        .await;
        let replacement = match replaced {
            Ok(replacement) => replacement,
            Err(e) => return Err(self.compensation.compensate(scope, e).await),
        };
        scope.commit();

        document.content = replacement.location.clone();
        self.attachments.retire(replacement).await?;
        info!(document_id = %id, files = document.content.file_count(), "Attachments replaced");
        Ok(document)
    }

    /// Trash the document's content, then delete its row.
    pub async fn delete(&self, _ctx: &RequestContext, id: DocumentId) -> AppResult<()> {
        let document = self.get(id).await?;
        self.attachments.teardown(&document.content).await?;
        if !self.documents.delete(id).await? {
            return Err(AppError::not_found(format!("Document {id} not found")));
        }
        info!(document_id = %id, variant = %document.tag(), "Document deleted");
        Ok(())
    }

    /// Append a lifecycle event.
    ///
    /// Versioned events snapshot the document's recipients and primary
    /// content unless recipients are given explicitly.
    pub async fn append_event(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        request: AppendEventRequest,
    ) -> AppResult<DocumentEvent> {
        let document = self.get(id).await?;
        let current = document.current_status();
        transition(current, request.event_type)?;

        let versioned = request.event_type.is_versioned();
        let recipients: Vec<RecipientSnapshot> = match &request.recipient_ids {
            Some(ids) => self
                .load_recipients(ids)
                .await?
                .iter()
                .map(RecipientSnapshot::from)
                .collect(),
            None if versioned => document
                .main_recipients
                .iter()
                .chain(&document.cc_recipients)
                .map(RecipientSnapshot::from)
                .collect(),
            None => Vec::new(),
        };
        let attachments = if versioned {
            self.snapshot_content(&document).await?
        } else {
            Vec::new()
        };

        self.ledger
            .append(
                current,
                AppendEvent {
                    document_id: id,
                    event_type: request.event_type,
                    editor_id: ctx.editor_id,
                    comment: request.comment,
                    additional_message: request.additional_message,
                    recipients,
                    attachments,
                },
            )
            .await
    }

    /// Event history of a document, oldest first.
    pub async fn list_events(&self, id: DocumentId) -> AppResult<Vec<DocumentEvent>> {
        if self.documents.find_record(id).await?.is_none() {
            return Err(AppError::not_found(format!("Document {id} not found")));
        }
        self.ledger.history(id).await
    }

    /// Documents matching the filter groups, newest first.
    ///
    /// Rows that fail to resolve are logged and left out of the page.
    pub async fn search(
        &self,
        groups: &[FilterGroup],
        page: PageRequest,
    ) -> AppResult<PageResponse<Document>> {
        let page = page.normalized();
        let ids = self.documents.search(groups, &page).await?;
        let mut items = Vec::with_capacity(ids.items.len());
        for id in ids.items {
            let Some(record) = self.documents.find_record(id).await? else {
                continue;
            };
            match resolve_document(record) {
                Ok(document) => items.push(document),
                Err(e) => warn!(document_id = %id, error = %e, "Skipping unresolvable document"),
            }
        }
        Ok(PageResponse::new(items, &page, ids.total_items))
    }

    fn ensure_editable(document: &Document) -> AppResult<()> {
        if strategy_for(document.tag()).is_editable() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Document {} is a historical {} document and is read-only",
                document.id,
                VariantTag::LegacyOutgoing
            )))
        }
    }

    fn content_name(&self, document: &Document, strategy: &dyn VariantStrategy) -> String {
        let number = if document.is_outgoing() {
            document.display_number()
        } else {
            document.number.clone().unwrap_or_else(|| UNNUMBERED.to_string())
        };
        content_name(
            &content_label(&number, document.creation_date),
            strategy.suffix(&self.config),
        )
    }

    async fn snapshot_content(&self, document: &Document) -> AppResult<Vec<AttachmentSnapshot>> {
        let primary = document
            .variant
            .generated()
            .and_then(|g| g.document_id.as_ref())
            .or_else(|| document.content.document_id())
            .or_else(|| document.content.folder_id());
        match primary {
            Some(id) => {
                let meta = self.store.get_file_metadata(id).await?;
                Ok(vec![AttachmentSnapshot::from(&meta)])
            }
            None => Ok(Vec::new()),
        }
    }

    async fn load_parent(&self, request: &CreateDocumentRequest) -> AppResult<ParentContext> {
        match (request.project_id, request.offer_id) {
            (Some(project_id), None) => self
                .references
                .find_project(project_id)
                .await?
                .map(ParentContext::Project)
                .ok_or_else(|| AppError::not_found(format!("Project {project_id} not found"))),
            (None, Some(offer_id)) => self
                .references
                .find_offer(offer_id)
                .await?
                .map(ParentContext::Offer)
                .ok_or_else(|| AppError::not_found(format!("Offer {offer_id} not found"))),
            _ => Err(AppError::validation(
                "Exactly one of project_id and offer_id must be set",
            )),
        }
    }

    async fn load_associations(
        &self,
        case_ids: &[CaseId],
        main_ids: &[EntityId],
        cc_ids: &[EntityId],
    ) -> AppResult<Associations> {
        Ok(Associations {
            cases: self.load_cases(case_ids).await?,
            main_recipients: self.load_recipients(main_ids).await?,
            cc_recipients: self.load_recipients(cc_ids).await?,
        })
    }

    async fn load_cases(&self, ids: &[CaseId]) -> AppResult<Vec<CaseRef>> {
        let ids = dedup(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cases = self.references.find_cases(&ids).await?;
        let found: HashSet<CaseId> = cases.iter().map(|c| c.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(*id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::not_found(format!(
                "Cases not found: {}",
                missing.join(", ")
            )));
        }
        Ok(cases)
    }

    async fn load_recipients(&self, ids: &[EntityId]) -> AppResult<Vec<Recipient>> {
        let ids = dedup(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let recipients = self.references.find_recipients(&ids).await?;
        let found: HashSet<EntityId> = recipients.iter().map(|r| r.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(*id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::not_found(format!(
                "Recipients not found: {}",
                missing.join(", ")
            )));
        }
        Ok(recipients)
    }
}

fn dedup<T: Copy + Eq + std::hash::Hash>(ids: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
