//! HTTP client for a running batchd server

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::types::{ErrorResponse, IngestRequest, IngestResponse};
use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("ingestion not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submit ids for processing, returning the ingestion id
    pub async fn submit(&self, ids: Vec<i64>, priority: &str) -> Result<String, ClientError> {
        debug!(count = ids.len(), %priority, "ApiClient::submit: called");
        let response = self
            .http
            .post(format!("{}/ingest", self.base_url))
            .json(&IngestRequest {
                ids,
                priority: priority.to_string(),
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<IngestResponse>().await?.ingestion_id),
            StatusCode::UNPROCESSABLE_ENTITY => Err(ClientError::Rejected(error_message(response).await)),
            status => Err(ClientError::Server {
                status,
                message: error_message(response).await,
            }),
        }
    }

    /// Fetch the status report for an ingestion as raw JSON
    pub async fn status(&self, ingestion_id: &str) -> Result<Value, ClientError> {
        debug!(%ingestion_id, "ApiClient::status: called");
        let response = self
            .http
            .get(format!("{}/status/{}", self.base_url, ingestion_id))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(ingestion_id.to_string())),
            status => Err(ClientError::Server {
                status,
                message: error_message(response).await,
            }),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(e) => format!("unreadable error body: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(&ClientConfig {
            server_url: "http://localhost:8000/".to_string(),
            timeout_ms: 500,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        // Port 9 (discard) is not expected to host an HTTP server
        let client = ApiClient::new(&ClientConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
        })
        .unwrap();
        let err = client.submit(vec![1], "HIGH").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
