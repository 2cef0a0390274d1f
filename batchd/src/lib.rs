//! batchd - priority-ordered, rate-limited batch ingestion
//!
//! Callers submit lists of integer identifiers with a priority. batchd splits
//! each list into fixed-size batches and runs them one at a time against a
//! downstream resource, highest priority and earliest arrival first, with a
//! minimum gap between consecutive batches.
//!
//! # Modules
//!
//! - [`domain`] - Ingestion and batch records, priorities, status folding
//! - [`state`] - Actor owning the record store
//! - [`scheduler`] - Priority queue, rate limiter and dispatch loop
//! - [`downstream`] - Downstream call trait and simulated resource
//! - [`ingest`] - Ingestion and status service
//! - [`api`] - HTTP API
//! - [`server`] - Service assembly
//! - [`client`] - HTTP client for the CLI
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod downstream;
pub mod ingest;
pub mod scheduler;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use client::{ApiClient, ClientError};
pub use config::{ClientConfig, Config, ServerConfig};
pub use domain::{
    Batch, BatchStatus, Clock, Ingestion, IngestionStatus, InvalidPriority, ManualClock, Priority, SystemClock,
};
pub use downstream::{BatchExecutor, DownstreamConfig, DownstreamError, SimulatedDownstream};
pub use ingest::{BatchView, IngestError, IngestionReport, IngestionService, split_ids};
pub use scheduler::{QueueEntry, QueueEntryStatus, QueueState, Scheduler, SchedulerConfig, SchedulerStats};
pub use server::Server;
pub use state::{StateCommand, StateError, StateManager, StateResponse};
