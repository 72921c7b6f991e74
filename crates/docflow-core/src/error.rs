//! Unified application error types for DocFlow.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The document lifecycle failure
//! classes (resolution, missing external id, integrity fault, transient
//! store failure, compensation failure) are first-class [`ErrorKind`]s so
//! callers can match on them instead of parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (invalid lifecycle transition, duplicate entry).
    Conflict,
    /// A persisted record does not match any known document variant.
    Resolution,
    /// An external store operation expected to return an id returned none.
    MissingExternalId,
    /// A document's content columns are inconsistent.
    IntegrityFault,
    /// A network or rate-limit failure from the external document store.
    EdsTransient,
    /// Undoing already-applied effects failed.
    CompensationFailure,
    /// A generated document has no usable named ranges.
    CorruptTemplate,
    /// A database error occurred.
    Database,
    /// The external document store rejected a request.
    ExternalService,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the failed operation as-is.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EdsTransient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Resolution => write!(f, "RESOLUTION"),
            Self::MissingExternalId => write!(f, "MISSING_EXTERNAL_ID"),
            Self::IntegrityFault => write!(f, "INTEGRITY_FAULT"),
            Self::EdsTransient => write!(f, "EDS_TRANSIENT"),
            Self::CompensationFailure => write!(f, "COMPENSATION_FAILURE"),
            Self::CorruptTemplate => write!(f, "CORRUPT_TEMPLATE"),
            Self::Database => write!(f, "DATABASE"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout DocFlow.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a variant resolution error.
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, message)
    }

    /// Create a missing-external-id error.
    pub fn missing_external_id(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingExternalId, message)
    }

    /// Create an integrity-fault error.
    pub fn integrity_fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IntegrityFault, message)
    }

    /// Create a transient external store error.
    pub fn eds_transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EdsTransient, message)
    }

    /// Create a compensation-failure error.
    pub fn compensation_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompensationFailure, message)
    }

    /// Create a corrupt-template error.
    pub fn corrupt_template(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptTemplate, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create an external service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Row not found"),
            other => Self::with_source(
                ErrorKind::Database,
                format!("Database error: {other}"),
                other,
            ),
        }
    }
}
