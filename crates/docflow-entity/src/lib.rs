//! # docflow-entity
//!
//! Domain entity models for DocFlow. Structs in this crate represent
//! database rows or domain value objects. Database rows additionally
//! derive `sqlx::FromRow`.

pub mod document;
pub mod event;
pub mod reference;
pub mod task;
