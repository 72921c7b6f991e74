//! Lifecycle status of a document, projected from its ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::EventType;

/// Lifecycle status. Never written directly; always the projection of the
/// latest ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    /// Created, not yet approved.
    Created,
    /// Approved for sending.
    Approved,
    /// Sent to recipients.
    Sent,
    /// Reopened after a correction.
    Changed,
    /// Withdrawn.
    Canceled,
}

impl DocumentStatus {
    /// Status a document takes after an event of this type.
    pub fn after(event_type: EventType) -> Self {
        match event_type {
            EventType::Created => Self::Created,
            EventType::Approved => Self::Approved,
            EventType::Sent => Self::Sent,
            EventType::Changed => Self::Changed,
            EventType::Canceled => Self::Canceled,
        }
    }

    /// Whether an event of `event_type` may follow this status.
    pub fn accepts(&self, event_type: EventType) -> bool {
        use EventType as E;
        match self {
            Self::Created => matches!(event_type, E::Approved | E::Changed | E::Canceled),
            Self::Approved => matches!(event_type, E::Sent | E::Changed | E::Canceled),
            Self::Changed => matches!(event_type, E::Approved | E::Changed | E::Canceled),
            Self::Sent => matches!(event_type, E::Sent),
            Self::Canceled => false,
        }
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Approved => "APPROVED",
            Self::Sent => "SENT",
            Self::Changed => "CHANGED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
