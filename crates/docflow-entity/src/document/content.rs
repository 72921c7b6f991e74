//! Physical content representation of a document in the external store.

use serde::{Deserialize, Serialize};

use docflow_core::types::ExternalId;

/// Coarse state of a document's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// Nothing materialized yet.
    Uninitialized,
    /// One file placed directly in the parent folder.
    SingleFile,
    /// A dedicated folder holding every file.
    MultiFile,
}

/// Where a document's content lives. Exactly one representation at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContentLocation {
    /// Nothing materialized yet.
    Uninitialized,
    /// One file placed directly in the parent folder.
    SingleFile {
        /// Store id of the file.
        document_id: ExternalId,
    },
    /// A dedicated folder holding every file.
    MultiFile {
        /// Store id of the folder.
        folder_id: ExternalId,
        /// Number of files inside the folder.
        attachment_count: u32,
    },
}

/// Inconsistent content columns found on a persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFault {
    /// Both `document_id` and `folder_id` are set.
    BothPopulated {
        /// The file id found.
        document_id: ExternalId,
        /// The folder id found.
        folder_id: ExternalId,
    },
    /// Neither column is set where content was expected.
    NonePopulated,
}

impl std::fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BothPopulated {
                document_id,
                folder_id,
            } => write!(
                f,
                "both document_id ({document_id}) and folder_id ({folder_id}) are populated"
            ),
            Self::NonePopulated => write!(f, "neither document_id nor folder_id is populated"),
        }
    }
}

impl ContentLocation {
    /// Rebuild the location from persisted columns.
    ///
    /// When both ids are present the folder wins and the fault is
    /// returned alongside so the caller can log it; read paths keep
    /// working on best-effort data.
    pub fn from_columns(
        document_id: Option<&str>,
        folder_id: Option<&str>,
        attachment_count: Option<i32>,
    ) -> (Self, Option<IntegrityFault>) {
        let document_id = ExternalId::from_reported(document_id.map(String::from));
        let folder_id = ExternalId::from_reported(folder_id.map(String::from));
        let count = attachment_count.unwrap_or(0).max(0) as u32;

        match (document_id, folder_id) {
            (None, None) => (Self::Uninitialized, None),
            (Some(document_id), None) => (Self::SingleFile { document_id }, None),
            (None, Some(folder_id)) => (
                Self::MultiFile {
                    folder_id,
                    attachment_count: count,
                },
                None,
            ),
            (Some(document_id), Some(folder_id)) => (
                Self::MultiFile {
                    folder_id: folder_id.clone(),
                    attachment_count: count,
                },
                Some(IntegrityFault::BothPopulated {
                    document_id,
                    folder_id,
                }),
            ),
        }
    }

    /// Split into `(document_id, folder_id, attachment_count)` columns.
    pub fn to_columns(&self) -> (Option<String>, Option<String>, Option<i32>) {
        match self {
            Self::Uninitialized => (None, None, None),
            Self::SingleFile { document_id } => (Some(document_id.0.clone()), None, None),
            Self::MultiFile {
                folder_id,
                attachment_count,
            } => (
                None,
                Some(folder_id.0.clone()),
                Some(*attachment_count as i32),
            ),
        }
    }

    /// Coarse state.
    pub fn state(&self) -> ContentState {
        match self {
            Self::Uninitialized => ContentState::Uninitialized,
            Self::SingleFile { .. } => ContentState::SingleFile,
            Self::MultiFile { .. } => ContentState::MultiFile,
        }
    }

    /// Id of the single file, if in single-file state.
    pub fn document_id(&self) -> Option<&ExternalId> {
        match self {
            Self::SingleFile { document_id } => Some(document_id),
            _ => None,
        }
    }

    /// Id of the content folder, if in multi-file state.
    pub fn folder_id(&self) -> Option<&ExternalId> {
        match self {
            Self::MultiFile { folder_id, .. } => Some(folder_id),
            _ => None,
        }
    }

    /// Number of files the content consists of.
    pub fn file_count(&self) -> u32 {
        match self {
            Self::Uninitialized => 0,
            Self::SingleFile { .. } => 1,
            Self::MultiFile {
                attachment_count, ..
            } => *attachment_count,
        }
    }
}
