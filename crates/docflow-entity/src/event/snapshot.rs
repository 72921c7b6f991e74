//! Frozen copies of recipients and attachments stored on events.
//!
//! Snapshots are owned values serialized into the event row. They never
//! reference the live entity, so later edits to an entity or file cannot
//! change what a past event recorded.

use serde::{Deserialize, Serialize};

use docflow_core::traits::FileMeta;
use docflow_core::types::{EntityId, ExternalId};

use crate::reference::Recipient;

/// A recipient as it was when the event was appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSnapshot {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
}

impl From<&Recipient> for RecipientSnapshot {
    fn from(recipient: &Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name.clone(),
            email: recipient.email.clone(),
        }
    }
}

/// A file reference as it was when the event was appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSnapshot {
    pub id: ExternalId,
    pub name: String,
    pub mime_type: Option<String>,
}

impl From<&FileMeta> for AttachmentSnapshot {
    fn from(meta: &FileMeta) -> Self {
        Self {
            id: meta.id.clone(),
            name: meta.name.clone(),
            mime_type: Some(meta.mime_type.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_detached_from_recipient() {
        let mut recipient = Recipient {
            id: EntityId(3),
            name: "Acme".into(),
            email: Some("office@acme.test".into()),
            address: None,
        };
        let snapshot = RecipientSnapshot::from(&recipient);
        recipient.name = "Acme Renamed".into();

        assert_eq!(snapshot.name, "Acme");
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["name"], "Acme");
    }
}
