//! Background task progress entities.

pub mod status;

pub use status::{TaskState, TaskStatus};
