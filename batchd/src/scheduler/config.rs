//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Identifiers per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum gap between one batch finishing and the next starting
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,

    /// Fallback poll interval while the queue is empty
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

fn default_batch_size() -> usize {
    3
}

fn default_min_spacing_ms() -> u64 {
    5_000
}

fn default_idle_poll_ms() -> u64 {
    1_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_spacing_ms: default_min_spacing_ms(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Get the minimum spacing as a Duration
    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }

    /// Get the idle poll interval as a Duration
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.min_spacing_ms, 5_000);
        assert_eq!(config.idle_poll_ms, 1_000);
    }

    #[test]
    fn test_durations() {
        let config = SchedulerConfig {
            min_spacing_ms: 250,
            idle_poll_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.min_spacing(), Duration::from_millis(250));
        assert_eq!(config.idle_poll(), Duration::from_millis(10));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: SchedulerConfig = serde_yaml::from_str("batch-size: 10").unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.min_spacing_ms, 5_000);
    }
}
