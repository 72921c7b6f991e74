//! Core traits defined in `docflow-core` and implemented by other crates.

pub mod document_store;

pub use document_store::{DocumentContent, DocumentStore, FileMeta, FileUpload, NamedRange};
