//! Core type definitions used across the DocFlow workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod tag;

pub use filter::{FilterField, FilterGroup, FilterOp, FilterValue};
pub use id::*;
pub use pagination::{PageRequest, PageResponse};
pub use tag::{TagMarker, find_tags};
