//! Shared reference entities a document points at but does not own.

pub mod case;
pub mod parent;
pub mod recipient;

pub use case::{CaseRef, ContractRef};
pub use parent::{OfferRef, ParentContext, ProjectRef};
pub use recipient::{Editor, Recipient};
