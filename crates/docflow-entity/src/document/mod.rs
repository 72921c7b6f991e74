//! Document domain entities.

pub mod content;
pub mod model;
pub mod status;
pub mod variant;

pub use content::{ContentLocation, ContentState, IntegrityFault};
pub use model::{Document, DocumentRecord, DocumentRow, NewDocument, ResolutionAttributes};
pub use status::DocumentStatus;
pub use variant::{DocumentVariant, GeneratedDocument, VariantTag};
