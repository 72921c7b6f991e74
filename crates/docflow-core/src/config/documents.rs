//! Document template and naming configuration.

use serde::{Deserialize, Serialize};

/// Template ids and naming suffixes used when materializing documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Template copied for outgoing documents in a project context.
    #[serde(default)]
    pub outgoing_contract_template_id: String,
    /// Template copied for outgoing documents in an offer context.
    #[serde(default)]
    pub outgoing_offer_template_id: String,
    /// Suffix appended to outgoing document names.
    #[serde(default = "default_outgoing_suffix")]
    pub outgoing_suffix: String,
    /// Suffix appended to incoming document names.
    #[serde(default = "default_incoming_suffix")]
    pub incoming_suffix: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            outgoing_contract_template_id: String::new(),
            outgoing_offer_template_id: String::new(),
            outgoing_suffix: default_outgoing_suffix(),
            incoming_suffix: default_incoming_suffix(),
        }
    }
}

fn default_outgoing_suffix() -> String {
    "Outgoing".to_string()
}

fn default_incoming_suffix() -> String {
    "Incoming".to_string()
}
