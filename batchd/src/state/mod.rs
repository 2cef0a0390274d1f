//! State management for batchd
//!
//! The StateManager actor owns the BatchStore and serializes every read and
//! write of ingestion and batch records.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
