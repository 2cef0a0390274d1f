//! Ingestion service
//!
//! Turns a submitted id list into persisted batches and dispatch requests,
//! and folds batch state back into the per-ingestion status report.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Batch, BatchStatus, Clock, Ingestion, IngestionStatus, InvalidPriority, Priority};
use crate::scheduler::Scheduler;
use crate::state::{StateError, StateManager};

/// Errors surfaced to ingestion callers
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    InvalidPriority(#[from] InvalidPriority),

    #[error("ids must contain at least one identifier")]
    EmptyRequest,

    #[error("ingestion not found: {0}")]
    NotFound(String),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Status report for one ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub ingestion_id: String,
    pub priority: Priority,
    pub created_at: i64,
    pub status: IngestionStatus,
    pub batches: Vec<BatchView>,
}

/// One batch inside an [`IngestionReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchView {
    pub batch_id: String,
    pub ids: Vec<i64>,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Batch> for BatchView {
    fn from(batch: Batch) -> Self {
        Self {
            batch_id: batch.id,
            ids: batch.ids,
            status: batch.status,
            error: batch.error,
        }
    }
}

/// Split ids into consecutive groups of at most `batch_size`, order preserved
pub fn split_ids(ids: &[i64], batch_size: usize) -> Vec<Vec<i64>> {
    ids.chunks(batch_size.max(1)).map(<[i64]>::to_vec).collect()
}

#[derive(Clone)]
pub struct IngestionService {
    state: StateManager,
    scheduler: Arc<Scheduler>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl IngestionService {
    pub fn new(state: StateManager, scheduler: Arc<Scheduler>, clock: Arc<dyn Clock>) -> Self {
        let batch_size = scheduler.config().batch_size;
        Self {
            state,
            scheduler,
            clock,
            batch_size,
        }
    }

    /// Accept an ingestion request and return its id.
    ///
    /// Validation happens before anything is stored, so a rejected request
    /// leaves no records and no queue entries behind.
    pub async fn ingest(&self, ids: Vec<i64>, priority: &str) -> Result<String, IngestError> {
        debug!(count = ids.len(), %priority, "IngestionService::ingest: called");
        let priority: Priority = priority.parse()?;
        if ids.is_empty() {
            return Err(IngestError::EmptyRequest);
        }

        let ingestion_id = Ingestion::generate_id();
        let batches: Vec<Batch> = split_ids(&ids, self.batch_size)
            .into_iter()
            .map(|group| Batch::new(&ingestion_id, group))
            .collect();

        let batch_ids = self.state.create_batches(batches).await?;
        let ingestion = Ingestion::new(&ingestion_id, priority, self.clock.now_ms(), batch_ids);
        self.state.create_ingestion(ingestion.clone()).await?;

        self.scheduler
            .submit(ingestion.priority, ingestion.created_at, &ingestion.id, &ingestion.batch_ids)
            .await;

        info!(
            ingestion_id = %ingestion.id,
            %priority,
            ids = ids.len(),
            batches = ingestion.batch_ids.len(),
            "Ingestion accepted"
        );
        Ok(ingestion.id)
    }

    /// Current status of an ingestion, batches in creation order
    pub async fn status(&self, ingestion_id: &str) -> Result<IngestionReport, IngestError> {
        debug!(%ingestion_id, "IngestionService::status: called");
        let ingestion = match self.state.get_ingestion_required(ingestion_id).await {
            Ok(ingestion) => ingestion,
            Err(StateError::NotFound(_)) => return Err(IngestError::NotFound(ingestion_id.to_string())),
            Err(e) => return Err(e.into()),
        };

        let batches = self.state.get_batches(&ingestion.batch_ids).await?;
        let status = IngestionStatus::aggregate(batches.iter().map(|b| b.status));

        Ok(IngestionReport {
            ingestion_id: ingestion.id,
            priority: ingestion.priority,
            created_at: ingestion.created_at,
            status,
            batches: batches.into_iter().map(BatchView::from).collect(),
        })
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }
}
