//! StateManager - actor that owns the BatchStore
//!
//! Processes commands via channels for thread-safe access to ingestion and
//! batch records. Status polling and scheduler writes are serialized through
//! the one actor task, so every single-record write is atomic to readers.

use std::collections::HashMap;

use batchstore::StoreError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{Batch, BatchStatus, Filter, Ingestion, Store};

use super::messages::{StateCommand, StateError, StateResponse};

/// Buffer size of the command channel
const COMMAND_BUFFER: usize = 256;

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn the actor over an empty store
    pub fn spawn() -> Self {
        Self::spawn_with_store(Store::new())
    }

    /// Spawn the actor over an existing store
    pub fn spawn_with_store(store: Store) -> Self {
        debug!("StateManager::spawn_with_store: called");
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(actor_loop(store, rx));
        info!("StateManager spawned");
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand,
    ) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Ingestion operations ===

    /// Create an ingestion record
    pub async fn create_ingestion(&self, ingestion: Ingestion) -> StateResponse<String> {
        debug!(ingestion_id = %ingestion.id, priority = %ingestion.priority, "create_ingestion: called");
        self.request(|reply| StateCommand::CreateIngestion { ingestion, reply })
            .await
    }

    /// Get an ingestion record by ID
    pub async fn get_ingestion(&self, id: &str) -> StateResponse<Option<Ingestion>> {
        debug!(%id, "get_ingestion: called");
        self.request(|reply| StateCommand::GetIngestion {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Get an ingestion record by ID, returning error if not found
    pub async fn get_ingestion_required(&self, id: &str) -> StateResponse<Ingestion> {
        self.get_ingestion(id)
            .await?
            .ok_or_else(|| StateError::NotFound(format!("Ingestion {}", id)))
    }

    // === Batch operations ===

    /// Create all batch records of one ingestion
    pub async fn create_batches(&self, batches: Vec<Batch>) -> StateResponse<Vec<String>> {
        debug!(count = batches.len(), "create_batches: called");
        self.request(|reply| StateCommand::CreateBatches { batches, reply })
            .await
    }

    /// Get a batch record by ID
    pub async fn get_batch(&self, id: &str) -> StateResponse<Option<Batch>> {
        debug!(%id, "get_batch: called");
        self.request(|reply| StateCommand::GetBatch {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Get several batches in the order given; unknown ids are skipped
    pub async fn get_batches(&self, ids: &[String]) -> StateResponse<Vec<Batch>> {
        debug!(count = ids.len(), "get_batches: called");
        self.request(|reply| StateCommand::GetBatches {
            ids: ids.to_vec(),
            reply,
        })
        .await
    }

    /// List batches with optional filters, ordered by batch id
    pub async fn list_batches(
        &self,
        ingestion_filter: Option<String>,
        status_filter: Option<BatchStatus>,
    ) -> StateResponse<Vec<Batch>> {
        debug!(?ingestion_filter, ?status_filter, "list_batches: called");
        self.request(|reply| StateCommand::ListBatches {
            ingestion_filter,
            status_filter,
            reply,
        })
        .await
    }

    /// Compare-and-set a batch's status.
    ///
    /// Returns the updated batch, or `None` when the batch was no longer in
    /// `from` (another dispatch got there first).
    pub async fn transition_batch(
        &self,
        id: &str,
        from: BatchStatus,
        to: BatchStatus,
        error: Option<String>,
    ) -> StateResponse<Option<Batch>> {
        debug!(%id, %from, %to, "transition_batch: called");
        self.request(|reply| StateCommand::TransitionBatch {
            id: id.to_string(),
            from,
            to,
            error,
            reply,
        })
        .await
    }

    /// Per-status batch totals
    pub async fn batch_counts(&self) -> StateResponse<HashMap<BatchStatus, usize>> {
        debug!("batch_counts: called");
        self.request(|reply| StateCommand::BatchCounts { reply }).await
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

fn store_err(e: StoreError) -> StateError {
    match e {
        StoreError::NotFound { collection, id } => StateError::NotFound(format!("{}/{}", collection, id)),
        other => StateError::StoreError(other.to_string()),
    }
}

fn batch_filters(ingestion_filter: Option<String>, status_filter: Option<BatchStatus>) -> Vec<Filter> {
    let mut filters = Vec::new();
    if let Some(ingestion_id) = ingestion_filter {
        filters.push(Filter::eq("ingestion_id", ingestion_id));
    }
    if let Some(status) = status_filter {
        filters.push(Filter::eq("status", status.as_str()));
    }
    filters
}

async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreateIngestion { ingestion, reply } => {
                debug!(ingestion_id = %ingestion.id, "actor_loop: CreateIngestion command");
                let _ = reply.send(store.create(ingestion).map_err(store_err));
            }

            StateCommand::GetIngestion { id, reply } => {
                debug!(%id, "actor_loop: GetIngestion command");
                let _ = reply.send(store.get(&id).map_err(store_err));
            }

            StateCommand::CreateBatches { batches, reply } => {
                debug!(count = batches.len(), "actor_loop: CreateBatches command");
                let result = batches
                    .into_iter()
                    .map(|batch| store.create(batch).map_err(store_err))
                    .collect();
                let _ = reply.send(result);
            }

            StateCommand::GetBatch { id, reply } => {
                debug!(%id, "actor_loop: GetBatch command");
                let _ = reply.send(store.get(&id).map_err(store_err));
            }

            StateCommand::GetBatches { ids, reply } => {
                debug!(count = ids.len(), "actor_loop: GetBatches command");
                let result = ids
                    .iter()
                    .filter_map(|id| store.get::<Batch>(id).map_err(store_err).transpose())
                    .collect();
                let _ = reply.send(result);
            }

            StateCommand::ListBatches {
                ingestion_filter,
                status_filter,
                reply,
            } => {
                debug!(?ingestion_filter, ?status_filter, "actor_loop: ListBatches command");
                let filters = batch_filters(ingestion_filter, status_filter);
                let _ = reply.send(store.list(&filters).map_err(store_err));
            }

            StateCommand::TransitionBatch {
                id,
                from,
                to,
                error,
                reply,
            } => {
                debug!(%id, %from, %to, "actor_loop: TransitionBatch command");
                let result = if from.can_transition_to(to) {
                    store
                        .modify(&id, |batch: &mut Batch| batch.transition(from, to, error))
                        .map_err(store_err)
                } else {
                    warn!(%id, %from, %to, "actor_loop: rejecting illegal transition");
                    Err(StateError::InvalidTransition { from, to })
                };
                let _ = reply.send(result);
            }

            StateCommand::BatchCounts { reply } => {
                debug!("actor_loop: BatchCounts command");
                let counts: HashMap<BatchStatus, usize> = BatchStatus::ALL
                    .into_iter()
                    .map(|status| (status, store.count::<Batch>(&[Filter::eq("status", status.as_str())])))
                    .collect();
                let _ = reply.send(Ok(counts));
            }

            StateCommand::Shutdown => {
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
