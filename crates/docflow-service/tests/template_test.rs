//! Integration tests for generated documents.

mod common;

use docflow_core::error::ErrorKind;
use docflow_core::traits::DocumentStore;
use docflow_core::types::{CaseId, ExternalId};
use docflow_service::document::{FieldValue, TemplateField};
use docflow_service::{TemplateEngine, UpdateDocumentRequest};

use common::TestHarness;

fn fields(description: &str) -> Vec<FieldValue> {
    vec![
        FieldValue::new(TemplateField::Number, "12"),
        FieldValue::new(TemplateField::CreationDate, "2024-03-01"),
        FieldValue::new(TemplateField::Description, description),
        FieldValue::new(TemplateField::ContextLabel, "KOB.GW.01: 01.01 Design"),
        FieldValue::new(TemplateField::MainRecipients, "Acme"),
        FieldValue::new(TemplateField::CcRecipients, ""),
    ]
}

/// A document with ranges created from `body`.
async fn tagged_document(h: &TestHarness, id: &str, body: &str) -> ExternalId {
    let id = ExternalId::new(id);
    h.memory.insert_document(id.clone(), "Letter", body);
    h.memory
        .create_named_ranges_from_tags(&id)
        .await
        .expect("ranges");
    id
}

#[tokio::test]
async fn test_missing_required_field_is_rejected_before_any_call() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(&h, "doc-x", "#TAG#number# #TAG#creationDate# #TAG#description#").await;

    let err = engine.fill(&id, &fields("   ")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.message.contains("description"));
    assert_eq!(h.store.total_calls(), 0);
}

#[tokio::test]
async fn test_document_without_ranges_is_corrupt() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = ExternalId::new("plain");
    h.memory.insert_document(id.clone(), "Plain", "No markers here");

    let err = engine.fill(&id, &fields("Roof")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CorruptTemplate);

    let err = engine.refresh(&id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CorruptTemplate);
    assert_eq!(h.store.count("fill_named_range"), 0);
}

#[tokio::test]
async fn test_missing_required_range_is_corrupt() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(&h, "doc-y", "#TAG#number# z dnia #TAG#creationDate#").await;

    let err = engine.fill(&id, &fields("Roof")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::CorruptTemplate);
    assert!(err.message.contains("description"));
    assert_eq!(h.store.count("fill_named_range"), 0);
}

#[tokio::test]
async fn test_optional_fields_without_range_are_skipped() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(
        &h,
        "doc-z",
        "Nr #TAG#number# z dnia #TAG#creationDate#\n#TAG#description#",
    )
    .await;

    engine.fill(&id, &fields("Roof repair")).await.expect("fill");

    let ranges: Vec<String> = h
        .store
        .calls_to("fill_named_range")
        .into_iter()
        .map(|args| args[1].clone())
        .collect();
    assert_eq!(ranges, vec!["number", "creationDate", "description"]);
    assert_eq!(h.memory.body(&id).expect("body"), "Nr 12 z dnia 2024-03-01\nRoof repair");
}

#[tokio::test]
async fn test_refresh_rebuilds_fully_tagged_document() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(
        &h,
        "doc-t",
        "#TAG#number# #TAG#creationDate# #TAG#description# #TAG#contextLabel#",
    )
    .await;

    let content = engine.refresh(&id).await.expect("refresh");

    assert_eq!(h.store.count("clear_named_ranges"), 1);
    assert_eq!(h.store.count("create_named_ranges_from_tags"), 1);
    // rebuilt, not appended to the existing set
    assert_eq!(content.named_ranges.len(), 4);
}

#[tokio::test]
async fn test_refresh_keeps_ranges_of_filled_document() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(&h, "doc-f", "#TAG#number# #TAG#creationDate# #TAG#description#").await;
    engine.fill(&id, &fields("Roof")).await.expect("fill");
    h.store.reset_calls();

    let content = engine.refresh(&id).await.expect("refresh");

    assert_eq!(content.named_ranges.len(), 3);
    assert_eq!(h.store.count("clear_named_ranges"), 0);
    assert_eq!(h.store.count("create_named_ranges_from_tags"), 0);

    engine.fill(&id, &fields("Roof, revised")).await.expect("refill");
    assert_eq!(h.memory.body(&id).expect("body"), "12 2024-03-01 Roof, revised");
}

#[tokio::test]
async fn test_refresh_ranges_only_new_tags() {
    let h = TestHarness::new();
    let engine = TemplateEngine::new(h.store.clone());
    let id = tagged_document(
        &h,
        "doc-n",
        "#TAG#number# #TAG#creationDate# #TAG#description# #TAG#mainRecipients#",
    )
    .await;
    h.memory
        .fill_named_range(&id, "creationDate", "2024-03-01")
        .await
        .expect("fill date");
    // an editor typed a new marker into the recipients line
    h.memory
        .fill_named_range(&id, "mainRecipients", "#TAG#signature#")
        .await
        .expect("fill recipients");
    h.store.reset_calls();

    let content = engine.refresh(&id).await.expect("refresh");

    assert_eq!(h.store.count("clear_named_ranges"), 0);
    assert_eq!(h.store.count("create_named_ranges_from_tags"), 1);
    let count = |name: &str| content.named_ranges.iter().filter(|r| r.name == name).count();
    assert_eq!(count("number"), 1);
    assert_eq!(count("description"), 1);
    assert_eq!(count("signature"), 1);
    assert_eq!(content.named_ranges.len(), 5);

    h.memory
        .fill_named_range(&id, "number", "12")
        .await
        .expect("fill number");
    assert_eq!(
        h.memory.body(&id).expect("body"),
        "12 2024-03-01 #TAG#description# #TAG#signature#"
    );
}

#[tokio::test]
async fn test_outgoing_update_refills_generated_document() {
    let h = TestHarness::new();
    let document = h
        .service
        .create(&h.ctx, common::outgoing_contract())
        .await
        .expect("create");
    let generated = document
        .variant
        .generated()
        .and_then(|g| g.document_id.clone())
        .expect("generated");
    h.store.reset_calls();

    let updated = h
        .service
        .update(
            &h.ctx,
            document.id,
            UpdateDocumentRequest {
                description: Some("Roof repair schedule, second stage".into()),
                case_ids: Some(vec![CaseId(2)]),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.description, "Roof repair schedule, second stage");
    assert_eq!(h.store.count("fill_named_range"), 6);
    // names do not depend on the description
    assert_eq!(h.store.count("update_file_metadata"), 0);
    assert_eq!(h.store.count("update_folder_metadata"), 0);

    let body = h.memory.body(&generated).expect("body");
    assert!(body.contains("Dotyczy: KOB.GW.01: 01.02 Supervision\n"), "{body}");
    assert!(body.ends_with("Roof repair schedule, second stage\n"), "{body}");

    let event = updated.last_event.expect("changed event");
    assert_eq!(event.event_type, docflow_entity::event::EventType::Changed);
}

#[tokio::test]
async fn test_update_without_field_changes_does_not_refill() {
    let h = TestHarness::new();
    let document = h
        .service
        .create(&h.ctx, common::outgoing_contract())
        .await
        .expect("create");
    h.store.reset_calls();

    h.service
        .update(
            &h.ctx,
            document.id,
            UpdateDocumentRequest {
                registration_date: Some(common::date()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(h.store.count("get_document"), 0);
    assert_eq!(h.store.count("fill_named_range"), 0);
}

#[tokio::test]
async fn test_outgoing_number_is_fixed() {
    let h = TestHarness::new();
    let document = h
        .service
        .create(&h.ctx, common::outgoing_contract())
        .await
        .expect("create");
    h.store.reset_calls();

    let err = h
        .service
        .update(
            &h.ctx,
            document.id,
            UpdateDocumentRequest {
                number: Some("K/1/2024".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .service
        .update(
            &h.ctx,
            document.id,
            UpdateDocumentRequest {
                case_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(h.store.total_calls(), 0);
    assert_eq!(h.db.event_count(), 1);
}
