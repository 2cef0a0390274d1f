//! Ingestion-level status aggregation

use serde::{Deserialize, Serialize};

use super::BatchStatus;

/// Overall status of an ingestion, folded from its batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    /// No batch has started
    YetToStart,
    /// A batch is in flight
    Triggered,
    /// Some batches finished, others still queued, none in flight
    Partial,
    /// Every batch completed
    Completed,
    /// Every batch finished and at least one failed
    Failed,
}

impl IngestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YetToStart => "yet_to_start",
            Self::Triggered => "triggered",
            Self::Partial => "partial",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Fold batch statuses into one ingestion status.
    ///
    /// An empty input reads as `YetToStart`.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = BatchStatus>,
    {
        let (mut total, mut waiting, mut triggered, mut completed, mut failed) = (0usize, 0, 0, 0, 0);
        for status in statuses {
            total += 1;
            match status {
                BatchStatus::YetToStart => waiting += 1,
                BatchStatus::Triggered => triggered += 1,
                BatchStatus::Completed => completed += 1,
                BatchStatus::Failed => failed += 1,
            }
        }

        if waiting == total {
            Self::YetToStart
        } else if completed == total {
            Self::Completed
        } else if triggered > 0 {
            Self::Triggered
        } else if waiting == 0 && failed > 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BatchStatus::*;

    #[test]
    fn test_all_waiting() {
        assert_eq!(IngestionStatus::aggregate([YetToStart, YetToStart]), IngestionStatus::YetToStart);
        assert_eq!(IngestionStatus::aggregate([]), IngestionStatus::YetToStart);
    }

    #[test]
    fn test_all_completed() {
        assert_eq!(IngestionStatus::aggregate([Completed, Completed]), IngestionStatus::Completed);
    }

    #[test]
    fn test_any_triggered_wins() {
        assert_eq!(IngestionStatus::aggregate([Triggered, YetToStart]), IngestionStatus::Triggered);
        assert_eq!(IngestionStatus::aggregate([Completed, Triggered]), IngestionStatus::Triggered);
        assert_eq!(IngestionStatus::aggregate([Failed, Triggered, YetToStart]), IngestionStatus::Triggered);
    }

    #[test]
    fn test_failure_is_not_hidden() {
        assert_eq!(IngestionStatus::aggregate([Completed, Failed]), IngestionStatus::Failed);
        assert_eq!(IngestionStatus::aggregate([Failed]), IngestionStatus::Failed);
        assert!(IngestionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_between_batches_is_partial() {
        assert_eq!(IngestionStatus::aggregate([Completed, YetToStart]), IngestionStatus::Partial);
        assert_eq!(IngestionStatus::aggregate([Failed, YetToStart]), IngestionStatus::Partial);
        assert!(!IngestionStatus::Partial.is_terminal());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&IngestionStatus::YetToStart).unwrap(), "\"yet_to_start\"");
        assert_eq!(serde_json::to_string(&IngestionStatus::Partial).unwrap(), "\"partial\"");
    }
}
