use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde_json::json;
use tracing::debug;

use crate::ingest::IngestionReport;

use super::ApiState;
use super::error::ApiError;
use super::types::{IngestRequest, IngestResponse, QueueResponse};

/// Handler for `POST /ingest`.
pub async fn ingest_handler(
    State(state): State<ApiState>,
    request: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))?;
    debug!(count = request.ids.len(), priority = %request.priority, "ingest_handler: called");

    let ingestion_id = state.service.ingest(request.ids, &request.priority).await?;
    Ok(Json(IngestResponse { ingestion_id }))
}

/// Handler for `GET /status/{ingestion_id}`.
pub async fn status_handler(
    State(state): State<ApiState>,
    Path(ingestion_id): Path<String>,
) -> Result<Json<IngestionReport>, ApiError> {
    debug!(%ingestion_id, "status_handler: called");
    Ok(Json(state.service.status(&ingestion_id).await?))
}

/// Handler for `GET /queue`.
pub async fn queue_handler(State(state): State<ApiState>) -> Result<Json<QueueResponse>, ApiError> {
    let scheduler = state.service.scheduler();
    Ok(Json(QueueResponse {
        state: scheduler.queue_state().await,
        entries: scheduler.queue_details().await,
        batches: state.service.state().batch_counts().await?,
    }))
}

/// Handler for `GET /health`.
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
