//! Newtype wrappers for row identifiers and external store identifiers.
//!
//! Relational rows are keyed by `BIGSERIAL` ids; using distinct types
//! prevents passing an `OfferId` where a `ProjectId` is expected. Ids
//! minted by the external document store are opaque strings wrapped in
//! [`ExternalId`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `i64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner integer value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of an outgoing or incoming document row.
    DocumentId
);

define_id!(
    /// Identifier of a ledger event row.
    EventId
);

define_id!(
    /// Identifier of a project (contract parent context).
    ProjectId
);

define_id!(
    /// Identifier of an offer (offer parent context).
    OfferId
);

define_id!(
    /// Identifier of a contract owning cases.
    ContractId
);

define_id!(
    /// Identifier of a case attached to documents.
    CaseId
);

define_id!(
    /// Identifier of a recipient organisation.
    EntityId
);

define_id!(
    /// Identifier of an editor (person acting on a document).
    PersonId
);

/// Opaque identifier of a file, folder, or template in the external
/// document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct ExternalId(pub String);

impl ExternalId {
    /// Wrap a raw id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a raw id reported by the store, treating blank values as absent.
    pub fn from_reported(raw: Option<String>) -> Option<Self> {
        raw.filter(|s| !s.trim().is_empty()).map(Self)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExternalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
