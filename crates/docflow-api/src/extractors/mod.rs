//! Custom Axum extractors.

pub mod editor;
pub mod pagination;

pub use editor::{EDITOR_HEADER, Editor};
pub use pagination::PaginationParams;
