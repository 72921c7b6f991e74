//! # docflow-core
//!
//! Core crate for DocFlow. Contains the external document store trait,
//! configuration schemas, typed identifiers, tag-marker scanning,
//! filter/pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocFlow crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
