//! Ledger event entities.

pub mod kind;
pub mod model;
pub mod snapshot;

pub use kind::EventType;
pub use model::{DocumentEvent, NewEvent};
pub use snapshot::{AttachmentSnapshot, RecipientSnapshot};
