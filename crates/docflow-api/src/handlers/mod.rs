//! Route handlers organized by domain.

pub mod attachment;
pub mod document;
pub mod event;
pub mod health;
pub mod task;
