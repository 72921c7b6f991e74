//! Repository traits and their PostgreSQL implementations.
//!
//! Services depend on the traits so flows can be exercised against
//! in-memory implementations in tests.

pub mod document;
pub mod event;
pub mod reference;

pub use document::{DocumentRepository, PgDocumentRepository};
pub use event::{EventRepository, PgEventRepository};
pub use reference::{PgReferenceRepository, ReferenceRepository};
