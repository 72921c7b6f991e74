//! Documents: variant resolution, content, templates and the service
//! tying them together.

pub mod attachments;
pub mod fields;
pub mod naming;
pub mod requests;
pub mod resolver;
pub mod service;
pub mod strategy;
pub mod template;

pub use attachments::{AttachmentService, Replacement};
pub use fields::{FieldValue, TemplateField};
pub use requests::{AppendEventRequest, CreateDocumentRequest, UpdateDocumentRequest};
pub use resolver::{resolve_document, resolve_variant};
pub use service::DocumentService;
pub use strategy::{VariantStrategy, strategy_for};
pub use template::TemplateEngine;
