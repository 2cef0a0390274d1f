//! Downstream resource calls
//!
//! The scheduler treats the downstream resource as an opaque unit of work per
//! identifier. [`SimulatedDownstream`] stands in for the real resource: a
//! configurable delay, optional jitter, and an optional failure rate.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A failed downstream call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownstreamError {
    #[error("downstream call for id {id} failed: {reason}")]
    CallFailed { id: i64, reason: String },

    #[error("batch execution aborted: {0}")]
    Aborted(String),
}

/// One call to the downstream resource per identifier
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn call(&self, id: i64) -> Result<(), DownstreamError>;
}

/// Simulated downstream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DownstreamConfig {
    /// Base duration of each call
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,

    /// Extra uniform delay in `[0, jitter-ms]`
    #[serde(default)]
    pub jitter_ms: u64,

    /// Probability in `[0, 1]` that a call fails
    #[serde(default)]
    pub failure_rate: f64,
}

fn default_call_delay_ms() -> u64 {
    1_000
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            call_delay_ms: default_call_delay_ms(),
            jitter_ms: 0,
            failure_rate: 0.0,
        }
    }
}

/// Sleep-based stand-in for the downstream resource
#[derive(Debug, Clone)]
pub struct SimulatedDownstream {
    config: DownstreamConfig,
}

impl SimulatedDownstream {
    pub fn new(config: DownstreamConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BatchExecutor for SimulatedDownstream {
    async fn call(&self, id: i64) -> Result<(), DownstreamError> {
        // ThreadRng is !Send, keep it out of the await
        let (delay, fail) = {
            let mut rng = rand::rng();
            let jitter = if self.config.jitter_ms > 0 {
                rng.random_range(0..=self.config.jitter_ms)
            } else {
                0
            };
            let fail = rng.random_bool(self.config.failure_rate.clamp(0.0, 1.0));
            (Duration::from_millis(self.config.call_delay_ms + jitter), fail)
        };

        debug!(id, ?delay, fail, "SimulatedDownstream::call: called");
        tokio::time::sleep(delay).await;

        if fail {
            return Err(DownstreamError::CallFailed {
                id,
                reason: "simulated downstream failure".to_string(),
            });
        }
        Ok(())
    }
}
