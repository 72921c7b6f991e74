//! Event type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of a ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Document created.
    Created,
    /// Document approved.
    Approved,
    /// Document sent.
    Sent,
    /// Document corrected.
    Changed,
    /// Document withdrawn.
    Canceled,
}

impl EventType {
    /// Whether events of this type carry a per-document version number.
    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Sent)
    }

    /// Return the type as an uppercase string.
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

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "APPROVED" => Ok(Self::Approved),
            "SENT" => Ok(Self::Sent),
            "CHANGED" => Ok(Self::Changed),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(format!("Unknown event type: {other}")),
        }
    }
}
