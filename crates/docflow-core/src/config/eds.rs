//! External document store configuration.

use serde::{Deserialize, Serialize};

/// Which [`DocumentStore`](crate::traits::DocumentStore) implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdsProviderKind {
    /// Drive/Docs REST API over HTTPS.
    Http,
    /// In-process store for local development.
    Memory,
}

/// External document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdsConfig {
    /// Provider selection.
    #[serde(default = "default_provider")]
    pub provider: EdsProviderKind,
    /// Base URL of the file/folder API.
    #[serde(default = "default_drive_url")]
    pub drive_base_url: String,
    /// Base URL of the upload endpoint.
    #[serde(default = "default_upload_url")]
    pub upload_base_url: String,
    /// Base URL of the document API.
    #[serde(default = "default_docs_url")]
    pub docs_base_url: String,
    /// OAuth bearer token used for every request.
    #[serde(default)]
    pub access_token: String,
    /// Permission granted on generated documents.
    #[serde(default)]
    pub permission: PermissionPolicy,
}

/// The fixed sharing policy applied by `create_permissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionPolicy {
    /// Grantee type (`domain`, `anyone`, `user`, `group`).
    #[serde(default = "default_permission_type")]
    pub grantee_type: String,
    /// Role granted (`reader`, `commenter`, `writer`).
    #[serde(default = "default_permission_role")]
    pub role: String,
    /// Domain for `domain` grants.
    #[serde(default)]
    pub domain: Option<String>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            grantee_type: default_permission_type(),
            role: default_permission_role(),
            domain: None,
        }
    }
}

fn default_provider() -> EdsProviderKind {
    EdsProviderKind::Http
}

fn default_drive_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_upload_url() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_docs_url() -> String {
    "https://docs.googleapis.com/v1".to_string()
}

fn default_permission_type() -> String {
    "anyone".to_string()
}

fn default_permission_role() -> String {
    "writer".to_string()
}
