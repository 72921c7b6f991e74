//! Concrete document variants.
//!
//! A document is one struct carrying a [`DocumentVariant`]: the variant
//! tag plus the payload only that variant needs. Behaviour that differs
//! per variant is dispatched on the tag by small strategy functions in
//! the service layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use docflow_core::types::ExternalId;

use crate::reference::{OfferRef, ParentContext, ProjectRef};

/// Which concrete kind of document a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTag {
    /// Outgoing document in a project context (`number == id`).
    OutgoingContract,
    /// Historical outgoing document whose number diverges from its id.
    LegacyOutgoing,
    /// Outgoing document in an offer context.
    OutgoingOffer,
    /// Incoming document in a project context.
    IncomingContract,
    /// Incoming document in an offer context.
    IncomingOffer,
}

impl VariantTag {
    /// All variants, in resolution order.
    pub const ALL: [VariantTag; 5] = [
        Self::OutgoingContract,
        Self::LegacyOutgoing,
        Self::OutgoingOffer,
        Self::IncomingContract,
        Self::IncomingOffer,
    ];

    /// Whether documents of this variant are authored by the organisation.
    pub fn is_outgoing(&self) -> bool {
        matches!(
            self,
            Self::OutgoingContract | Self::LegacyOutgoing | Self::OutgoingOffer
        )
    }

    /// Whether the variant is kept for historical rows only.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacyOutgoing)
    }

    /// Return the variant as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutgoingContract => "outgoing_contract",
            Self::LegacyOutgoing => "legacy_outgoing",
            Self::OutgoingOffer => "outgoing_offer",
            Self::IncomingContract => "incoming_contract",
            Self::IncomingOffer => "incoming_offer",
        }
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The template-generated body of an outgoing document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    /// Template the document was copied from.
    pub template_id: Option<ExternalId>,
    /// The generated document, once created.
    pub document_id: Option<ExternalId>,
}

/// Variant tag plus variant-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DocumentVariant {
    /// See [`VariantTag::OutgoingContract`].
    OutgoingContract {
        /// Owning project.
        project: ProjectRef,
        /// Generated body.
        generated: GeneratedDocument,
    },
    /// See [`VariantTag::LegacyOutgoing`].
    LegacyOutgoing {
        /// Owning project or offer.
        parent: ParentContext,
        /// Generated body.
        generated: GeneratedDocument,
    },
    /// See [`VariantTag::OutgoingOffer`].
    OutgoingOffer {
        /// Owning offer.
        offer: OfferRef,
        /// Generated body.
        generated: GeneratedDocument,
    },
    /// See [`VariantTag::IncomingContract`].
    IncomingContract {
        /// Owning project.
        project: ProjectRef,
    },
    /// See [`VariantTag::IncomingOffer`].
    IncomingOffer {
        /// Owning offer.
        offer: OfferRef,
    },
}

impl DocumentVariant {
    /// The tag of this variant.
    pub fn tag(&self) -> VariantTag {
        match self {
            Self::OutgoingContract { .. } => VariantTag::OutgoingContract,
            Self::LegacyOutgoing { .. } => VariantTag::LegacyOutgoing,
            Self::OutgoingOffer { .. } => VariantTag::OutgoingOffer,
            Self::IncomingContract { .. } => VariantTag::IncomingContract,
            Self::IncomingOffer { .. } => VariantTag::IncomingOffer,
        }
    }

    /// The parent context.
    pub fn parent(&self) -> ParentContext {
        match self {
            Self::OutgoingContract { project, .. } | Self::IncomingContract { project } => {
                ParentContext::Project(project.clone())
            }
            Self::OutgoingOffer { offer, .. } | Self::IncomingOffer { offer } => {
                ParentContext::Offer(offer.clone())
            }
            Self::LegacyOutgoing { parent, .. } => parent.clone(),
        }
    }

    /// Folder the document's content is materialized under.
    pub fn parent_folder_id(&self) -> &ExternalId {
        match self {
            Self::OutgoingContract { project, .. } | Self::IncomingContract { project } => {
                &project.letters_folder_id
            }
            Self::OutgoingOffer { offer, .. } | Self::IncomingOffer { offer } => &offer.folder_id,
            Self::LegacyOutgoing { parent, .. } => parent.folder_id(),
        }
    }

    /// Generated body, for outgoing variants.
    pub fn generated(&self) -> Option<&GeneratedDocument> {
        match self {
            Self::OutgoingContract { generated, .. }
            | Self::LegacyOutgoing { generated, .. }
            | Self::OutgoingOffer { generated, .. } => Some(generated),
            Self::IncomingContract { .. } | Self::IncomingOffer { .. } => None,
        }
    }

    /// Mutable generated body, for outgoing variants.
    pub fn generated_mut(&mut self) -> Option<&mut GeneratedDocument> {
        match self {
            Self::OutgoingContract { generated, .. }
            | Self::LegacyOutgoing { generated, .. }
            | Self::OutgoingOffer { generated, .. } => Some(generated),
            Self::IncomingContract { .. } | Self::IncomingOffer { .. } => None,
        }
    }
}
