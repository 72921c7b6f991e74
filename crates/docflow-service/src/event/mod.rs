//! Event ledger and status projection.

pub mod ledger;

pub use ledger::{AppendEvent, EventLedger, transition};
