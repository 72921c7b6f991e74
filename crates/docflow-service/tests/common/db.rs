//! In-memory repositories.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::types::{
    CaseId, DocumentId, EntityId, EventId, FilterGroup, OfferId, PageRequest, PageResponse,
    PersonId, ProjectId,
};
use docflow_database::repositories::{DocumentRepository, EventRepository, ReferenceRepository};
use docflow_entity::document::{
    ContentLocation, Document, DocumentRecord, DocumentRow, DocumentStatus, GeneratedDocument,
    NewDocument,
};
use docflow_entity::event::{DocumentEvent, NewEvent};
use docflow_entity::reference::{CaseRef, OfferRef, ProjectRef, Recipient};

#[derive(Debug, Clone)]
struct StoredDocument {
    row: DocumentRow,
    cases: Vec<CaseRef>,
    main: Vec<Recipient>,
    cc: Vec<Recipient>,
}

#[derive(Debug, Default)]
struct State {
    next_document: i64,
    next_event: i64,
    documents: BTreeMap<DocumentId, StoredDocument>,
    events: Vec<DocumentEvent>,
    projects: HashMap<ProjectId, ProjectRef>,
    offers: HashMap<OfferId, OfferRef>,
    cases: HashMap<CaseId, CaseRef>,
    recipients: HashMap<EntityId, Recipient>,
    fail_insert: bool,
    fail_delete: bool,
    fail_update_content: bool,
    /// Write the event row, then fail before the cache update.
    fail_event_after_write: bool,
    /// Fail the transactional row + CREATED event writes, writing nothing.
    fail_creation_event: bool,
}

impl State {
    fn insert_row(&mut self, new: &NewDocument) -> DocumentId {
        self.next_document += 1;
        let id = DocumentId(self.next_document);
        let (document_id, folder_id, attachment_count) = new.content.to_columns();
        let parent = new.variant.parent();
        let generated = new.variant.generated();
        let is_outgoing = new.variant.tag().is_outgoing();
        let number = match (&new.number, is_outgoing) {
            (None, true) => Some(id.to_string()),
            (number, _) => number.clone(),
        };
        let row = DocumentRow {
            id,
            is_outgoing,
            number,
            description: new.description.clone(),
            creation_date: new.creation_date,
            registration_date: new.registration_date,
            document_id,
            folder_id,
            attachment_count,
            status: DocumentStatus::Created,
            project_id: parent.project_id(),
            offer_id: parent.offer_id(),
            template_id: generated.and_then(|g| g.template_id.as_ref().map(|t| t.0.clone())),
            generated_document_id: generated
                .and_then(|g| g.document_id.as_ref().map(|d| d.0.clone())),
            editor_id: new.editor_id,
            last_event_id: None,
            last_updated: Utc::now(),
        };
        self.documents.insert(
            id,
            StoredDocument {
                row,
                cases: new.cases.clone(),
                main: new.main_recipients.clone(),
                cc: new.cc_recipients.clone(),
            },
        );
        id
    }

    fn write_content(
        &mut self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
    ) -> AppResult<()> {
        let stored = self
            .documents
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        let (document_id, folder_id, attachment_count) = content.to_columns();
        stored.row.document_id = document_id;
        stored.row.folder_id = folder_id;
        stored.row.attachment_count = attachment_count;
        if let Some(generated) = generated {
            stored.row.template_id = generated.template_id.as_ref().map(|t| t.0.clone());
            stored.row.generated_document_id =
                generated.document_id.as_ref().map(|d| d.0.clone());
        }
        stored.row.last_updated = Utc::now();
        Ok(())
    }

    /// Number and store the event, then point the row's cache at it.
    fn push_event(&mut self, event: &NewEvent, status: DocumentStatus) -> DocumentEvent {
        let version_number = event.event_type.is_versioned().then(|| {
            let previous = self
                .events
                .iter()
                .filter(|e| e.document_id == event.document_id && e.event_type == event.event_type)
                .count();
            previous as i32 + 1
        });
        self.next_event += 1;
        let stored = event
            .clone()
            .into_event(EventId(self.next_event), version_number, Utc::now());
        self.events.push(stored.clone());
        if let Some(document) = self.documents.get_mut(&event.document_id) {
            document.row.last_event_id = Some(stored.id);
            document.row.status = status;
        }
        stored
    }
}

/// Documents, events and reference data behind one lock.
#[derive(Debug, Default)]
pub struct MemoryDb {
    state: Mutex<State>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&self, project: ProjectRef) {
        self.state.lock().unwrap().projects.insert(project.id, project);
    }

    pub fn add_offer(&self, offer: OfferRef) {
        self.state.lock().unwrap().offers.insert(offer.id, offer);
    }

    pub fn add_case(&self, case: CaseRef) {
        self.state.lock().unwrap().cases.insert(case.id, case);
    }

    pub fn add_recipient(&self, recipient: Recipient) {
        self.state
            .lock()
            .unwrap()
            .recipients
            .insert(recipient.id, recipient);
    }

    /// Rename a recipient in the reference data.
    pub fn rename_recipient(&self, id: EntityId, name: &str) {
        if let Some(r) = self.state.lock().unwrap().recipients.get_mut(&id) {
            r.name = name.to_string();
        }
    }

    /// Store a raw row, bypassing the service (historical data).
    pub fn insert_row(&self, row: DocumentRow) {
        let mut state = self.state.lock().unwrap();
        state.next_document = state.next_document.max(row.id.get());
        state.documents.insert(
            row.id,
            StoredDocument {
                row,
                cases: Vec::new(),
                main: Vec::new(),
                cc: Vec::new(),
            },
        );
    }

    pub fn row(&self, id: DocumentId) -> Option<DocumentRow> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(&id)
            .map(|d| d.row.clone())
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn event_count(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }

    pub fn fail_insert(&self, on: bool) {
        self.state.lock().unwrap().fail_insert = on;
    }

    pub fn fail_delete(&self, on: bool) {
        self.state.lock().unwrap().fail_delete = on;
    }

    pub fn fail_update_content(&self, on: bool) {
        self.state.lock().unwrap().fail_update_content = on;
    }

    pub fn fail_event_after_write(&self, on: bool) {
        self.state.lock().unwrap().fail_event_after_write = on;
    }

    pub fn fail_creation_event(&self, on: bool) {
        self.state.lock().unwrap().fail_creation_event = on;
    }
}

fn injected(what: &str) -> AppError {
    AppError::database(format!("injected failure in {what}"))
}

#[async_trait]
impl DocumentRepository for MemoryDb {
    async fn insert(&self, new: &NewDocument) -> AppResult<DocumentId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_insert {
            return Err(injected("insert"));
        }
        Ok(state.insert_row(new))
    }

    async fn insert_created(
        &self,
        new: &NewDocument,
        attempt_id: Uuid,
    ) -> AppResult<(DocumentId, DocumentEvent)> {
        let mut state = self.state.lock().unwrap();
        if state.fail_insert {
            return Err(injected("insert"));
        }
        if state.fail_creation_event {
            return Err(injected("CREATED event"));
        }
        let id = state.insert_row(new);
        let event = state.push_event(
            &NewEvent::created(id, new.editor_id, attempt_id),
            DocumentStatus::Created,
        );
        Ok((id, event))
    }

    async fn complete_creation(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
        editor_id: Option<PersonId>,
        attempt_id: Uuid,
    ) -> AppResult<DocumentEvent> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update_content {
            return Err(injected("update_content"));
        }
        if state.fail_creation_event {
            return Err(injected("CREATED event"));
        }
        state.write_content(id, content, generated)?;
        Ok(state.push_event(
            &NewEvent::created(id, editor_id, attempt_id),
            DocumentStatus::Created,
        ))
    }

    async fn find_record(&self, id: DocumentId) -> AppResult<Option<DocumentRecord>> {
        let state = self.state.lock().unwrap();
        let Some(stored) = state.documents.get(&id) else {
            return Ok(None);
        };
        let row = stored.row.clone();
        Ok(Some(DocumentRecord {
            project: row.project_id.and_then(|p| state.projects.get(&p).cloned()),
            offer: row.offer_id.and_then(|o| state.offers.get(&o).cloned()),
            cases: stored.cases.clone(),
            main_recipients: stored.main.clone(),
            cc_recipients: stored.cc.clone(),
            last_event: row
                .last_event_id
                .and_then(|e| state.events.iter().find(|ev| ev.id == e).cloned()),
            row,
        }))
    }

    async fn update_content(
        &self,
        id: DocumentId,
        content: &ContentLocation,
        generated: Option<&GeneratedDocument>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update_content {
            return Err(injected("update_content"));
        }
        state.write_content(id, content, generated)
    }

    async fn update_details(&self, document: &Document) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .documents
            .get_mut(&document.id)
            .ok_or_else(|| AppError::not_found(format!("Document {} not found", document.id)))?;
        stored.row.number = document.number.clone();
        stored.row.description = document.description.clone();
        stored.row.creation_date = document.creation_date;
        stored.row.registration_date = document.registration_date;
        stored.row.editor_id = document.editor_id;
        stored.row.last_updated = Utc::now();
        stored.cases = document.cases.clone();
        stored.main = document.main_recipients.clone();
        stored.cc = document.cc_recipients.clone();
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(injected("delete"));
        }
        state.events.retain(|e| e.document_id != id);
        Ok(state.documents.remove(&id).is_some())
    }

    async fn search(
        &self,
        _groups: &[FilterGroup],
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentId>> {
        let state = self.state.lock().unwrap();
        let ids: Vec<DocumentId> = state.documents.keys().rev().copied().collect();
        let total = ids.len() as u64;
        let items = ids
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }
}

#[async_trait]
impl EventRepository for MemoryDb {
    async fn append(&self, event: &NewEvent, status: DocumentStatus) -> AppResult<DocumentEvent> {
        // a round trip to the database
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&event.document_id) {
            return Err(AppError::not_found(format!(
                "Document {} not found",
                event.document_id
            )));
        }
        if state.fail_event_after_write {
            state.next_event += 1;
            let stored = event
                .clone()
                .into_event(EventId(state.next_event), None, Utc::now());
            state.events.push(stored);
            return Err(injected("event append"));
        }
        Ok(state.push_event(event, status))
    }

    async fn delete_by_attempt(&self, attempt_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.events.len();
        let touched: Vec<DocumentId> = state
            .events
            .iter()
            .filter(|e| e.attempt_id == attempt_id)
            .map(|e| e.document_id)
            .collect();
        state.events.retain(|e| e.attempt_id != attempt_id);
        let removed = (before - state.events.len()) as u64;

        for id in touched {
            let latest = state
                .events
                .iter()
                .filter(|e| e.document_id == id)
                .max_by_key(|e| e.id)
                .map(|e| (e.id, DocumentStatus::after(e.event_type)));
            if let Some(document) = state.documents.get_mut(&id) {
                document.row.last_event_id = latest.map(|(id, _)| id);
                if let Some((_, status)) = latest {
                    document.row.status = status;
                }
            }
        }
        Ok(removed)
    }

    async fn find_by_document(&self, document_id: DocumentId) -> AppResult<Vec<DocumentEvent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .events
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReferenceRepository for MemoryDb {
    async fn find_project(&self, id: ProjectId) -> AppResult<Option<ProjectRef>> {
        Ok(self.state.lock().unwrap().projects.get(&id).cloned())
    }

    async fn find_offer(&self, id: OfferId) -> AppResult<Option<OfferRef>> {
        Ok(self.state.lock().unwrap().offers.get(&id).cloned())
    }

    async fn find_cases(&self, ids: &[CaseId]) -> AppResult<Vec<CaseRef>> {
        let state = self.state.lock().unwrap();
        Ok(ids.iter().filter_map(|id| state.cases.get(id).cloned()).collect())
    }

    async fn find_recipients(&self, ids: &[EntityId]) -> AppResult<Vec<Recipient>> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.recipients.get(id).cloned())
            .collect())
    }
}
