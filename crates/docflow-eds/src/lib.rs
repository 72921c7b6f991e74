//! # docflow-eds
//!
//! Implementations of [`DocumentStore`](docflow_core::traits::DocumentStore):
//! a REST provider for the Drive v3 / Docs v1 surface and an in-process
//! provider for local development.

pub mod docs;
pub mod providers;

use std::sync::Arc;

use docflow_core::config::{EdsConfig, EdsProviderKind};
use docflow_core::result::AppResult;
use docflow_core::traits::DocumentStore;

pub use providers::{HttpDocumentStore, MemoryDocumentStore};

/// Build the provider selected by `config`.
pub fn build_store(config: &EdsConfig) -> AppResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.provider {
        EdsProviderKind::Http => Arc::new(HttpDocumentStore::new(config)?),
        EdsProviderKind::Memory => Arc::new(MemoryDocumentStore::new()),
    };
    tracing::info!(provider = store.provider_type(), "External document store ready");
    Ok(store)
}
