//! Batch domain type
//!
//! One dispatchable slice of an ingestion's identifiers, and the state
//! machine the scheduler drives it through.

use std::collections::HashMap;

use batchstore::{IndexValue, Record, now_ms};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Batch execution status.
///
/// Moves forward only: `YetToStart -> Triggered -> (Completed | Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Queued, not yet picked up
    #[default]
    YetToStart,
    /// Dispatched, in flight
    Triggered,
    /// Every identifier processed
    Completed,
    /// A downstream call failed; `error` holds the message
    Failed,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 4] = [Self::YetToStart, Self::Triggered, Self::Completed, Self::Failed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::YetToStart => "yet_to_start",
            Self::Triggered => "triggered",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal single step
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::YetToStart, Self::Triggered) | (Self::Triggered, Self::Completed) | (Self::Triggered, Self::Failed)
        )
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of identifiers belonging to one ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique identifier
    pub id: String,

    /// Owning ingestion (lookup only)
    pub ingestion_id: String,

    /// Identifiers in dispatch order, never empty
    pub ids: Vec<i64>,

    /// Current status
    pub status: BatchStatus,

    /// Failure message, only set once `status` is `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp (unix ms)
    pub created_at: i64,

    /// Last update timestamp (unix ms)
    pub updated_at: i64,
}

impl Batch {
    /// Create a new batch in `YetToStart`
    pub fn new(ingestion_id: impl Into<String>, ids: Vec<i64>) -> Self {
        let ingestion_id = ingestion_id.into();
        debug!(%ingestion_id, len = ids.len(), "Batch::new: called");
        let now = now_ms();
        Self {
            id: Uuid::now_v7().to_string(),
            ingestion_id,
            ids,
            status: BatchStatus::YetToStart,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compare-and-set the status.
    ///
    /// Applies only when the current status is `from` and `from -> to` is a
    /// legal step. Returns whether the change was made. `error` is recorded
    /// only on the transition to `Failed`.
    pub fn transition(&mut self, from: BatchStatus, to: BatchStatus, error: Option<String>) -> bool {
        debug!(id = %self.id, current = %self.status, %from, %to, "Batch::transition: called");
        if self.status != from || !from.can_transition_to(to) {
            return false;
        }
        self.status = to;
        if to == BatchStatus::Failed {
            self.error = error;
        }
        self.updated_at = now_ms();
        true
    }
}

impl Record for Batch {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "batches"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), IndexValue::String(self.status.to_string()));
        fields.insert("ingestion_id".to_string(), IndexValue::String(self.ingestion_id.clone()));
        fields
    }
}
