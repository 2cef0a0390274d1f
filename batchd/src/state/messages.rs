//! State manager messages
//!
//! Commands and responses for the actor pattern.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Batch, BatchStatus, Ingestion};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Illegal batch transition {from} -> {to}")]
    InvalidTransition { from: BatchStatus, to: BatchStatus },

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Ingestion operations
    CreateIngestion {
        ingestion: Ingestion,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    GetIngestion {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<Ingestion>>>,
    },

    // Batch operations
    CreateBatches {
        batches: Vec<Batch>,
        reply: oneshot::Sender<StateResponse<Vec<String>>>,
    },
    GetBatch {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<Batch>>>,
    },
    GetBatches {
        ids: Vec<String>,
        reply: oneshot::Sender<StateResponse<Vec<Batch>>>,
    },
    ListBatches {
        ingestion_filter: Option<String>,
        status_filter: Option<BatchStatus>,
        reply: oneshot::Sender<StateResponse<Vec<Batch>>>,
    },
    TransitionBatch {
        id: String,
        from: BatchStatus,
        to: BatchStatus,
        error: Option<String>,
        reply: oneshot::Sender<StateResponse<Option<Batch>>>,
    },
    BatchCounts {
        reply: oneshot::Sender<StateResponse<HashMap<BatchStatus, usize>>>,
    },

    // Shutdown
    Shutdown,
}
