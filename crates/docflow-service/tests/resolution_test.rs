//! Integration tests for reading persisted and historical rows.

mod common;

use docflow_core::error::ErrorKind;
use docflow_core::types::{ExternalId, PageRequest};
use docflow_entity::document::{ContentLocation, VariantTag};
use docflow_service::UpdateDocumentRequest;

use common::{TestHarness, doc, raw_row, upload};

#[tokio::test]
async fn test_legacy_rows_are_read_only() {
    let h = TestHarness::new();
    h.memory
        .insert_document(ExternalId::new("legacy-file"), "K-12-2019.pdf", "");
    let mut row = raw_row(20, true, Some("K/12/2019"));
    row.document_id = Some("legacy-file".into());
    h.db.insert_row(row);

    let document = h.service.get(doc(20)).await.expect("get");
    assert_eq!(document.tag(), VariantTag::LegacyOutgoing);
    assert_eq!(document.display_number(), "K/12/2019");

    let err = h
        .service
        .update(
            &h.ctx,
            doc(20),
            UpdateDocumentRequest {
                description: Some("Edited".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .service
        .append_attachments(&h.ctx, doc(20), vec![upload("late.pdf")])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(h.store.total_calls(), 0);

    h.service.delete(&h.ctx, doc(20)).await.expect("delete");
    assert!(h.is_trashed("legacy-file"));
    assert!(h.db.row(doc(20)).is_none());
}

#[tokio::test]
async fn test_current_outgoing_row_resolves_from_columns() {
    let h = TestHarness::new();
    let mut row = raw_row(21, true, Some("21"));
    row.folder_id = Some("folder-21".into());
    row.attachment_count = Some(1);
    row.template_id = Some("tpl-contract".into());
    row.generated_document_id = Some("doc-21".into());
    h.db.insert_row(row);

    let document = h.service.get(doc(21)).await.expect("get");

    assert_eq!(document.tag(), VariantTag::OutgoingContract);
    let generated = document.variant.generated().expect("generated");
    assert_eq!(generated.document_id, Some(ExternalId::new("doc-21")));
    assert_eq!(generated.template_id, Some(ExternalId::new("tpl-contract")));
}

#[tokio::test]
async fn test_unresolvable_rows_fail_loudly_and_are_skipped_in_search() {
    let h = TestHarness::new();
    let valid = h
        .service
        .create(&h.ctx, common::incoming_contract(1))
        .await
        .expect("create");
    let mut orphan = raw_row(30, false, Some("ZP/30"));
    orphan.project_id = None;
    h.db.insert_row(orphan);

    let err = h.service.get(doc(30)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert!(err.message.contains("is_outgoing=false"), "{}", err.message);
    assert!(err.message.contains("project_id=none"));
    assert!(err.message.contains("id=30"));

    let page = h
        .service
        .search(&[], PageRequest::new(1, 10))
        .await
        .expect("search");
    let ids: Vec<_> = page.items.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![valid.id]);
    assert_eq!(page.total_items, 2);
}

#[tokio::test]
async fn test_both_content_columns_read_as_folder() {
    let h = TestHarness::new();
    let mut row = raw_row(40, false, Some("ZP/40"));
    row.document_id = Some("file-40".into());
    row.folder_id = Some("folder-40".into());
    row.attachment_count = Some(2);
    h.db.insert_row(row);

    let document = h.service.get(doc(40)).await.expect("get");

    assert_eq!(
        document.content,
        ContentLocation::MultiFile {
            folder_id: ExternalId::new("folder-40"),
            attachment_count: 2,
        }
    );
}

#[tokio::test]
async fn test_search_pages_newest_first() {
    let h = TestHarness::new();
    for _ in 0..3 {
        h.service
            .create(&h.ctx, common::incoming_contract(1))
            .await
            .expect("create");
    }

    let first = h
        .service
        .search(&[], PageRequest::new(1, 2))
        .await
        .expect("search");
    let second = h
        .service
        .search(&[], PageRequest::new(2, 2))
        .await
        .expect("search");

    let ids: Vec<i64> = first
        .items
        .iter()
        .chain(&second.items)
        .map(|d| d.id.get())
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_next());
    assert!(!second.has_next());
}
