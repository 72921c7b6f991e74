//! Progress tracking for long-running requests.

pub mod tracker;

pub use tracker::TaskTracker;
