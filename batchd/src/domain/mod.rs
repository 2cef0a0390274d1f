//! Domain types for batchd
//!
//! Records: Ingestion, Batch. Both implement the Record trait for
//! BatchStore persistence. IngestionStatus folds batch states into the
//! value the status endpoint reports.

mod batch;
mod clock;
mod ingestion;
mod priority;
mod status;

pub use batch::{Batch, BatchStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ingestion::Ingestion;
pub use priority::{InvalidPriority, Priority};
pub use status::IngestionStatus;

// Re-export batchstore types for convenience
pub use batchstore::{Filter, FilterOp, IndexValue, Record, Store};
