//! Batch scheduler
//!
//! A single dispatch loop that:
//! - Orders pending batches by (priority, ingestion arrival, insertion order)
//! - Claims each batch with a compare-and-set before running it
//! - Keeps at least `min-spacing-ms` between one batch finishing and the next starting

mod config;
mod core;
mod limiter;
mod queue;

pub use config::SchedulerConfig;
pub use self::core::Scheduler;
pub use limiter::RateLimiter;
pub use queue::{QueueEntry, QueueEntryStatus, QueueState, SchedulerStats};
