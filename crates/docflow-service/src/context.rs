//! Request context carrying the acting person.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docflow_core::types::PersonId;

/// Context for the current request.
///
/// Authentication happens upstream; the engine only records who acted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation id for logs.
    pub request_id: Uuid,
    /// The person acting, when known.
    pub editor_id: Option<PersonId>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(editor_id: Option<PersonId>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            editor_id,
            request_time: Utc::now(),
        }
    }

    /// Context for work not triggered by a person (background tasks).
    pub fn system() -> Self {
        Self::new(None)
    }
}
