//! Per-variant behaviour.
//!
//! Each variant family gets a small strategy object; the service looks it
//! up by tag instead of branching on the variant at every call site.

use docflow_core::config::DocumentsConfig;
use docflow_entity::document::{Document, DocumentVariant, VariantTag};
use docflow_entity::reference::ParentContext;

use super::fields::{contract_context_label, offer_context_label};

/// Behaviour that differs between variant families.
pub trait VariantStrategy: Send + Sync {
    /// Direction suffix used in content names.
    fn suffix<'c>(&self, config: &'c DocumentsConfig) -> &'c str;

    /// Template for newly generated documents, if the family has one.
    fn template_id<'c>(&self, config: &'c DocumentsConfig) -> Option<&'c str>;

    /// Context label substituted into generated documents.
    fn context_label(&self, document: &Document) -> String;

    /// Whether content may be edited.
    fn is_editable(&self) -> bool {
        true
    }
}

struct OutgoingContractStrategy;
struct OutgoingOfferStrategy;
struct LegacyOutgoingStrategy;
struct IncomingStrategy;

impl VariantStrategy for OutgoingContractStrategy {
    fn suffix<'c>(&self, config: &'c DocumentsConfig) -> &'c str {
        &config.outgoing_suffix
    }

    fn template_id<'c>(&self, config: &'c DocumentsConfig) -> Option<&'c str> {
        non_blank(&config.outgoing_contract_template_id)
    }

    fn context_label(&self, document: &Document) -> String {
        contract_context_label(&document.cases)
    }
}

impl VariantStrategy for OutgoingOfferStrategy {
    fn suffix<'c>(&self, config: &'c DocumentsConfig) -> &'c str {
        &config.outgoing_suffix
    }

    fn template_id<'c>(&self, config: &'c DocumentsConfig) -> Option<&'c str> {
        non_blank(&config.outgoing_offer_template_id)
    }

    fn context_label(&self, document: &Document) -> String {
        match &document.variant {
            DocumentVariant::OutgoingOffer { offer, .. } => {
                offer_context_label(offer, &document.cases)
            }
            _ => String::new(),
        }
    }
}

impl VariantStrategy for LegacyOutgoingStrategy {
    fn suffix<'c>(&self, config: &'c DocumentsConfig) -> &'c str {
        &config.outgoing_suffix
    }

    fn template_id<'c>(&self, _config: &'c DocumentsConfig) -> Option<&'c str> {
        None
    }

    fn context_label(&self, document: &Document) -> String {
        match &document.variant {
            DocumentVariant::LegacyOutgoing {
                parent: ParentContext::Offer(offer),
                ..
            } => offer_context_label(offer, &document.cases),
            _ => contract_context_label(&document.cases),
        }
    }

    fn is_editable(&self) -> bool {
        false
    }
}

impl VariantStrategy for IncomingStrategy {
    fn suffix<'c>(&self, config: &'c DocumentsConfig) -> &'c str {
        &config.incoming_suffix
    }

    fn template_id<'c>(&self, _config: &'c DocumentsConfig) -> Option<&'c str> {
        None
    }

    fn context_label(&self, document: &Document) -> String {
        contract_context_label(&document.cases)
    }
}

/// Strategy for a variant tag.
pub fn strategy_for(tag: VariantTag) -> &'static dyn VariantStrategy {
    match tag {
        VariantTag::OutgoingContract => &OutgoingContractStrategy,
        VariantTag::OutgoingOffer => &OutgoingOfferStrategy,
        VariantTag::LegacyOutgoing => &LegacyOutgoingStrategy,
        VariantTag::IncomingContract | VariantTag::IncomingOffer => &IncomingStrategy,
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
