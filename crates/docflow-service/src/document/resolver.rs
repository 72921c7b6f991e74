//! Variant resolution.
//!
//! The decision table is evaluated top to bottom and the first matching
//! rule wins. Rule order matters: a persisted outgoing project document
//! whose number diverges from its id is legacy even though rule 1 would
//! otherwise accept its project.

use tracing::warn;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::types::ExternalId;
use docflow_entity::document::{
    ContentLocation, Document, DocumentRecord, DocumentVariant, GeneratedDocument, IntegrityFault,
    ResolutionAttributes, VariantTag,
};
use docflow_entity::reference::ParentContext;

/// Determine which variant a set of attributes describes.
pub fn resolve_variant(attrs: &ResolutionAttributes) -> AppResult<VariantTag> {
    let has_project = attrs.project_id.is_some();
    let has_offer = attrs.offer_id.is_some();
    let number_matches_id = match attrs.id {
        None => true,
        Some(id) => attrs
            .number
            .as_deref()
            .is_some_and(|n| n.trim() == id.to_string()),
    };

    let tag = if attrs.is_outgoing && has_project && number_matches_id {
        VariantTag::OutgoingContract
    } else if attrs.is_outgoing && attrs.id.is_some() && !number_matches_id {
        VariantTag::LegacyOutgoing
    } else if attrs.is_outgoing && has_offer {
        VariantTag::OutgoingOffer
    } else if !attrs.is_outgoing && has_project {
        VariantTag::IncomingContract
    } else if !attrs.is_outgoing && has_offer {
        VariantTag::IncomingOffer
    } else {
        return Err(AppError::resolution(format!(
            "No document variant matches ({attrs})"
        )));
    };
    Ok(tag)
}

/// Shape the payload for `tag` from a loaded record.
pub fn build_variant(record: &DocumentRecord, tag: VariantTag) -> AppResult<DocumentVariant> {
    let attrs = || record.attributes();
    let generated = || GeneratedDocument {
        template_id: ExternalId::from_reported(record.row.template_id.clone()),
        document_id: ExternalId::from_reported(record.row.generated_document_id.clone()),
    };
    let project = || {
        record.project.clone().ok_or_else(|| {
            AppError::resolution(format!("{tag} requires a loaded project ({})", attrs()))
        })
    };
    let offer = || {
        record.offer.clone().ok_or_else(|| {
            AppError::resolution(format!("{tag} requires a loaded offer ({})", attrs()))
        })
    };

    Ok(match tag {
        VariantTag::OutgoingContract => DocumentVariant::OutgoingContract {
            project: project()?,
            generated: generated(),
        },
        VariantTag::LegacyOutgoing => {
            let parent = match (&record.project, &record.offer) {
                (Some(project), _) => ParentContext::Project(project.clone()),
                (None, Some(offer)) => ParentContext::Offer(offer.clone()),
                (None, None) => {
                    return Err(AppError::resolution(format!(
                        "Legacy document has neither project nor offer ({})",
                        attrs()
                    )));
                }
            };
            DocumentVariant::LegacyOutgoing {
                parent,
                generated: generated(),
            }
        }
        VariantTag::OutgoingOffer => DocumentVariant::OutgoingOffer {
            offer: offer()?,
            generated: generated(),
        },
        VariantTag::IncomingContract => DocumentVariant::IncomingContract { project: project()? },
        VariantTag::IncomingOffer => DocumentVariant::IncomingOffer { offer: offer()? },
    })
}

/// Shape the payload of a variant about to be created.
///
/// The legacy variant is never produced here.
pub fn new_variant(
    tag: VariantTag,
    parent: ParentContext,
    template_id: Option<ExternalId>,
) -> AppResult<DocumentVariant> {
    let generated = GeneratedDocument {
        template_id,
        document_id: None,
    };
    match (tag, parent) {
        (VariantTag::OutgoingContract, ParentContext::Project(project)) => {
            Ok(DocumentVariant::OutgoingContract { project, generated })
        }
        (VariantTag::OutgoingOffer, ParentContext::Offer(offer)) => {
            Ok(DocumentVariant::OutgoingOffer { offer, generated })
        }
        (VariantTag::IncomingContract, ParentContext::Project(project)) => {
            Ok(DocumentVariant::IncomingContract { project })
        }
        (VariantTag::IncomingOffer, ParentContext::Offer(offer)) => {
            Ok(DocumentVariant::IncomingOffer { offer })
        }
        (VariantTag::LegacyOutgoing, _) => Err(AppError::internal(
            "Legacy documents cannot be created",
        )),
        (tag, parent) => Err(AppError::resolution(format!(
            "Parent context does not fit {tag} (project_id={:?}, offer_id={:?})",
            parent.project_id(),
            parent.offer_id()
        ))),
    }
}

/// Resolve a loaded record into a document aggregate.
///
/// Inconsistent content columns are logged and read best-effort.
pub fn resolve_document(record: DocumentRecord) -> AppResult<Document> {
    let tag = resolve_variant(&record.attributes())?;
    let variant = build_variant(&record, tag)?;

    let row = record.row;
    let (content, fault) = ContentLocation::from_columns(
        row.document_id.as_deref(),
        row.folder_id.as_deref(),
        row.attachment_count,
    );
    let fault = fault.or_else(|| {
        (content == ContentLocation::Uninitialized).then_some(IntegrityFault::NonePopulated)
    });
    if let Some(fault) = &fault {
        let error = AppError::integrity_fault(format!("Document {}: {fault}", row.id));
        warn!(
            document_id = %row.id,
            variant = %tag,
            error = %error,
            "Reading document best-effort"
        );
    }

    Ok(Document {
        id: row.id,
        number: row.number,
        description: row.description,
        creation_date: row.creation_date,
        registration_date: row.registration_date,
        content,
        status: row.status,
        variant,
        cases: record.cases,
        main_recipients: record.main_recipients,
        cc_recipients: record.cc_recipients,
        editor_id: row.editor_id,
        last_event: record.last_event,
        last_updated: row.last_updated,
    })
}
