//! Ingestion domain type

use std::collections::HashMap;

use batchstore::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Priority;

/// One accepted bulk request.
///
/// Written once when the request is accepted and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingestion {
    /// Unique identifier
    pub id: String,

    /// Priority class, primary queue key
    pub priority: Priority,

    /// Arrival time (unix ms), secondary queue key
    pub created_at: i64,

    /// Batches in identifier order
    pub batch_ids: Vec<String>,
}

impl Ingestion {
    /// Generate a fresh ingestion id
    pub fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }

    pub fn new(id: impl Into<String>, priority: Priority, created_at: i64, batch_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            created_at,
            batch_ids,
        }
    }
}

impl Record for Ingestion {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.created_at
    }

    fn collection_name() -> &'static str {
        "ingestions"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("priority".to_string(), IndexValue::String(self.priority.to_string()));
        fields
    }
}
