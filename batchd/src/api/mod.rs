//! HTTP API.
//!
//! - `POST /ingest` accepts `{"ids": [...], "priority": "HIGH"}` and returns `{"ingestion_id": ...}`
//! - `GET /status/{ingestion_id}` reports the ingestion and its batches
//! - `GET /queue` shows scheduler state
//! - `GET /health` liveness probe

mod error;
mod handlers;
pub mod types;

pub use error::ApiError;

use axum::Router;
use axum::routing::{get, post};

use crate::ingest::IngestionService;

use handlers::{health_handler, ingest_handler, queue_handler, status_handler};

#[derive(Clone)]
pub struct ApiState {
    service: IngestionService,
}

/// Build the API router around an ingestion service.
pub fn router(service: IngestionService) -> Router {
    Router::new()
        .route("/ingest", post(ingest_handler))
        .route("/status/{ingestion_id}", get(status_handler))
        .route("/queue", get(queue_handler))
        .route("/health", get(health_handler))
        .with_state(ApiState { service })
}
