//! Request and response bodies for the HTTP API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::BatchStatus;
use crate::scheduler::{QueueEntry, QueueState};

/// Request payload for `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Identifiers to process.
    pub ids: Vec<i64>,
    /// One of HIGH, MEDIUM, LOW (case-insensitive).
    pub priority: String,
}

/// Response payload for `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub ingestion_id: String,
}

/// Response payload for `GET /queue`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueResponse {
    pub state: QueueState,
    pub entries: Vec<QueueEntry>,
    pub batches: HashMap<BatchStatus, usize>,
}

/// Response payload for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
