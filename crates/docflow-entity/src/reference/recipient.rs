//! Recipients and editors.

use serde::{Deserialize, Serialize};

use docflow_core::types::{EntityId, PersonId};

/// An organisation a document is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    /// Entity id.
    pub id: EntityId,
    /// Organisation name.
    pub name: String,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// The person acting on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Editor {
    /// Person id.
    pub id: PersonId,
    /// Display name.
    pub name: String,
}
