//! `Editor` extractor: reads the acting person from a request header.
//!
//! Authentication happens in front of this service; the gateway forwards
//! the authenticated person's id in [`EDITOR_HEADER`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use docflow_core::error::AppError;
use docflow_core::types::PersonId;
use docflow_service::RequestContext;

use crate::error::ApiError;

/// Header carrying the acting person's id.
pub const EDITOR_HEADER: &str = "x-editor-id";

/// Request context of the acting person, available in handlers.
#[derive(Debug, Clone)]
pub struct Editor(pub RequestContext);

impl Editor {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for Editor {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Editor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let editor_id = match parts.headers.get(EDITOR_HEADER) {
            None => None,
            Some(value) => {
                let id = value
                    .to_str()
                    .ok()
                    .and_then(|v| v.parse::<PersonId>().ok())
                    .ok_or_else(|| {
                        AppError::validation(format!("Invalid {EDITOR_HEADER} header"))
                    })?;
                Some(id)
            }
        };

        let ctx = RequestContext::new(editor_id);
        tracing::debug!(
            request_id = %ctx.request_id,
            editor_id = ?ctx.editor_id,
            "Request context created"
        );
        Ok(Editor(ctx))
    }
}
