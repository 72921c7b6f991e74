//! # docflow-database
//!
//! PostgreSQL connection management, migrations, dynamic filter
//! compilation, and repository implementations for documents, events,
//! and the reference data they point at.

pub mod connection;
pub mod filter;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
