//! Shared fixtures for service integration tests.

#![allow(dead_code)]

pub mod db;
pub mod store;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{NaiveDate, Utc};

use docflow_core::config::DocumentsConfig;
use docflow_core::traits::FileUpload;
use docflow_core::types::{
    CaseId, ContractId, DocumentId, EntityId, ExternalId, OfferId, PersonId, ProjectId,
};
use docflow_eds::MemoryDocumentStore;
use docflow_entity::document::{DocumentRow, DocumentStatus};
use docflow_entity::reference::{CaseRef, ContractRef, OfferRef, ProjectRef, Recipient};
use docflow_service::{CreateDocumentRequest, DocumentService, RequestContext};

pub use db::MemoryDb;
pub use store::{Fault, RecordingStore};

pub const CONTRACT_TEMPLATE: &str = "tpl-contract";
pub const OFFER_TEMPLATE: &str = "tpl-offer";
pub const PROJECT_FOLDER: &str = "letters-7";
pub const OFFER_FOLDER: &str = "offer-3";

const TEMPLATE_BODY: &str = "Nr #TAG#number# z dnia #TAG#creationDate#\n\
    Dotyczy: #TAG#contextLabel#\n\
    Do: #TAG#mainRecipients#\n\
    DW: #TAG#ccRecipients#\n\
    #TAG#description#\n";

/// A service wired to a recording in-memory store and in-memory
/// repositories, seeded with one project, one offer, cases and
/// recipients.
pub struct TestHarness {
    pub memory: Arc<MemoryDocumentStore>,
    pub store: Arc<RecordingStore>,
    pub db: Arc<MemoryDb>,
    pub service: DocumentService,
    pub ctx: RequestContext,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(DocumentsConfig {
            outgoing_contract_template_id: CONTRACT_TEMPLATE.into(),
            outgoing_offer_template_id: OFFER_TEMPLATE.into(),
            ..DocumentsConfig::default()
        })
    }

    pub fn with_config(config: DocumentsConfig) -> Self {
        let memory = Arc::new(MemoryDocumentStore::new());
        memory.insert_folder(ExternalId::new(PROJECT_FOLDER), "Letters");
        memory.insert_folder(ExternalId::new(OFFER_FOLDER), "Offer 3");
        memory.insert_document(ExternalId::new(CONTRACT_TEMPLATE), "Contract letter", TEMPLATE_BODY);
        memory.insert_document(ExternalId::new(OFFER_TEMPLATE), "Offer letter", TEMPLATE_BODY);

        let store = Arc::new(RecordingStore::new(memory.clone()));
        let db = Arc::new(MemoryDb::new());
        seed_references(&db);

        let service = DocumentService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            store.clone(),
            config,
        );

        Self {
            memory,
            store,
            db,
            service,
            ctx: RequestContext::new(Some(PersonId(1))),
        }
    }

    /// Live files directly inside a folder.
    pub fn children(&self, folder: &str) -> Vec<String> {
        self.memory
            .children(&ExternalId::new(folder))
            .into_iter()
            .map(|m| m.id.0)
            .collect()
    }

    pub fn is_trashed(&self, id: &str) -> bool {
        self.memory.is_trashed(&ExternalId::new(id))
    }
}

fn seed_references(db: &MemoryDb) {
    db.add_project(ProjectRef {
        id: ProjectId(7),
        our_id: "KOB".into(),
        letters_folder_id: ExternalId::new(PROJECT_FOLDER),
    });
    db.add_offer(OfferRef {
        id: OfferId(3),
        description: "Bridge inspection".into(),
        folder_id: ExternalId::new(OFFER_FOLDER),
    });
    let contract = ContractRef {
        id: ContractId(1),
        number: "12/2024".into(),
        our_id: Some("KOB.GW.01".into()),
        alias: None,
    };
    db.add_case(CaseRef {
        id: CaseId(1),
        number: "01.01".into(),
        name: "Design".into(),
        contract: Some(contract.clone()),
    });
    db.add_case(CaseRef {
        id: CaseId(2),
        number: "01.02".into(),
        name: "Supervision".into(),
        contract: Some(contract),
    });
    db.add_case(CaseRef {
        id: CaseId(3),
        number: "".into(),
        name: "Site visit".into(),
        contract: None,
    });
    for (id, name) in [(1, "Acme"), (2, "Globex"), (3, "Initech")] {
        db.add_recipient(Recipient {
            id: EntityId(id),
            name: name.into(),
            email: Some(format!("office@{}.test", name.to_lowercase())),
            address: None,
        });
    }
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

pub fn upload(name: &str) -> FileUpload {
    FileUpload::new(
        name,
        Some("application/pdf".into()),
        Bytes::from(format!("%PDF {name}")),
    )
}

pub fn outgoing_contract() -> CreateDocumentRequest {
    CreateDocumentRequest {
        is_outgoing: true,
        project_id: Some(ProjectId(7)),
        offer_id: None,
        number: None,
        description: "Roof repair schedule".into(),
        creation_date: date(),
        registration_date: None,
        case_ids: vec![CaseId(1), CaseId(2)],
        main_recipient_ids: vec![EntityId(1)],
        cc_recipient_ids: vec![EntityId(2)],
        attachments: vec![],
    }
}

pub fn outgoing_offer() -> CreateDocumentRequest {
    CreateDocumentRequest {
        project_id: None,
        offer_id: Some(OfferId(3)),
        case_ids: vec![CaseId(3)],
        ..outgoing_contract()
    }
}

pub fn incoming_contract(files: usize) -> CreateDocumentRequest {
    CreateDocumentRequest {
        is_outgoing: false,
        project_id: Some(ProjectId(7)),
        offer_id: None,
        number: Some("ZP/1".into()),
        description: "Invoice for March".into(),
        creation_date: date(),
        registration_date: Some(date()),
        case_ids: vec![CaseId(1)],
        main_recipient_ids: vec![],
        cc_recipient_ids: vec![],
        attachments: (1..=files).map(|i| upload(&format!("scan-{i}.pdf"))).collect(),
    }
}

pub fn doc(id: i64) -> DocumentId {
    DocumentId(id)
}

/// A raw project row as historical data would have stored it.
pub fn raw_row(id: i64, is_outgoing: bool, number: Option<&str>) -> DocumentRow {
    DocumentRow {
        id: DocumentId(id),
        is_outgoing,
        number: number.map(String::from),
        description: "Imported letter".into(),
        creation_date: date(),
        registration_date: None,
        document_id: None,
        folder_id: None,
        attachment_count: None,
        status: DocumentStatus::Created,
        project_id: Some(ProjectId(7)),
        offer_id: None,
        template_id: None,
        generated_document_id: None,
        editor_id: None,
        last_event_id: None,
        last_updated: Utc::now(),
    }
}
