//! BatchStore - keyed record storage for batchd
//!
//! Holds any serde-serializable type that implements [`Record`], grouped into
//! collections by [`Record::collection_name`]. Each record carries a set of
//! indexed fields so callers can list by status or parent without
//! deserializing every record.
//!
//! # Example
//!
//! ```ignore
//! use batchstore::{Filter, FilterOp, IndexValue, Store};
//!
//! let mut store = Store::new();
//! store.create(batch)?;
//! let pending: Vec<Batch> = store.list(&[Filter {
//!     field: "status".to_string(),
//!     op: FilterOp::Eq,
//!     value: IndexValue::String("yet_to_start".to_string()),
//! }])?;
//! ```

mod error;
mod record;
mod store;

pub use error::{Result, StoreError};
pub use record::{Filter, FilterOp, IndexValue, Record};
pub use store::Store;

/// Current wall-clock time as unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
