//! Queue types for the scheduler

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;
use tokio::time::Instant;

use crate::domain::Priority;

/// A pending request to dispatch one batch
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub priority: Priority,
    /// Ingestion arrival time (unix ms)
    pub arrival_ms: i64,
    pub ingestion_id: String,
    pub batch_id: String,
    /// Insertion sequence, breaks ties between equal keys
    pub seq: u64,
    pub enqueued_at: Instant,
}

impl DispatchRequest {
    fn key(&self) -> (Priority, i64, u64) {
        (self.priority, self.arrival_ms, self.seq)
    }
}

impl Eq for DispatchRequest {}

impl PartialEq for DispatchRequest {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for DispatchRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest key pops first
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for DispatchRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending dispatches ordered by (priority, arrival time, insertion order)
#[derive(Debug, Default)]
pub struct DispatchQueue {
    heap: BinaryHeap<DispatchRequest>,
    next_seq: u64,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one dispatch request
    pub fn push(&mut self, priority: Priority, arrival_ms: i64, ingestion_id: &str, batch_id: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(DispatchRequest {
            priority,
            arrival_ms,
            ingestion_id: ingestion_id.to_string(),
            batch_id: batch_id.to_string(),
            seq,
            enqueued_at: Instant::now(),
        });
    }

    /// Remove the request with the smallest key, `None` when empty
    pub fn pop(&mut self) -> Option<DispatchRequest> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Pending requests in the order they would pop
    pub fn in_order(&self) -> Vec<DispatchRequest> {
        let mut entries = self.heap.clone().into_sorted_vec();
        entries.reverse();
        entries
    }
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone, Serialize)]
pub struct SchedulerStats {
    pub total_enqueued: u64,
    pub total_dispatched: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    /// Popped entries whose batch was no longer `yet_to_start`
    pub duplicates_discarded: u64,
    /// Popped entries whose batch record does not exist
    pub orphans_discarded: u64,
    pub peak_queue_depth: usize,
    /// Time spent waiting on the rate limiter
    pub total_throttle_ms: u64,
}

/// Queue state snapshot
#[derive(Debug, Clone, Serialize)]
pub struct QueueState {
    pub queued: usize,
    pub in_flight: Option<QueueEntry>,
    pub rate_limited: bool,
    pub stats: SchedulerStats,
}

/// One queue entry for display
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub batch_id: String,
    pub ingestion_id: String,
    pub priority: Priority,
    pub status: QueueEntryStatus,
    /// Time queued, or time running for the in-flight entry
    pub wait_time_ms: u64,
}

/// Status of a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryStatus {
    InFlight,
    Queued,
}
