//! # docflow-service
//!
//! The document lifecycle engine. [`DocumentService`] orchestrates the
//! variant resolver, the attachment state machine, the template engine,
//! and the event ledger, and rolls back partial work through the
//! compensation coordinator when a multi-step flow fails.
//!
//! Services follow constructor injection: every dependency is provided at
//! construction time via `Arc` references.

pub mod compensation;
pub mod context;
pub mod document;
pub mod event;
pub mod task;

pub use compensation::{CompensationCoordinator, CompensationScope};
pub use context::RequestContext;
pub use document::{
    AppendEventRequest, AttachmentService, CreateDocumentRequest, DocumentService,
    TemplateEngine, UpdateDocumentRequest,
};
pub use event::EventLedger;
pub use task::TaskTracker;
