//! The parent context that owns a document: a project or an offer.

use serde::{Deserialize, Serialize};

use docflow_core::types::{ExternalId, OfferId, ProjectId};

/// A project in whose letters folder contract documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRef {
    /// Project id.
    pub id: ProjectId,
    /// Internal project code.
    pub our_id: String,
    /// Store folder holding the project's correspondence.
    pub letters_folder_id: ExternalId,
}

/// An offer in whose folder offer documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OfferRef {
    /// Offer id.
    pub id: OfferId,
    /// Offer description, used in generated context labels.
    pub description: String,
    /// Store folder of the offer.
    pub folder_id: ExternalId,
}

/// Exactly one of project or offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParentContext {
    /// Contract family.
    Project(ProjectRef),
    /// Offer family.
    Offer(OfferRef),
}

impl ParentContext {
    /// Folder under which this context's documents are materialized.
    pub fn folder_id(&self) -> &ExternalId {
        match self {
            Self::Project(project) => &project.letters_folder_id,
            Self::Offer(offer) => &offer.folder_id,
        }
    }

    /// Project id, when the parent is a project.
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            Self::Project(project) => Some(project.id),
            Self::Offer(_) => None,
        }
    }

    /// Offer id, when the parent is an offer.
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::Project(_) => None,
            Self::Offer(offer) => Some(offer.id),
        }
    }
}
