//! Scheduler implementation
//!
//! A single long-lived loop pops the next dispatch request, claims its batch
//! with a `yet_to_start -> triggered` compare-and-set, runs it against the
//! downstream executor, records the outcome, and paces itself with the rate
//! limiter. The queue lock is held only for pop and claim, never across
//! execution or sleeping.

use std::sync::Arc;

use eyre::{Context, Result};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{Batch, BatchStatus, Priority};
use crate::downstream::{BatchExecutor, DownstreamError};
use crate::state::{StateError, StateManager};

use super::config::SchedulerConfig;
use super::limiter::RateLimiter;
use super::queue::{DispatchQueue, QueueEntry, QueueEntryStatus, QueueState, SchedulerStats};

/// The batch currently executing
#[derive(Debug, Clone)]
struct InFlight {
    batch_id: String,
    ingestion_id: String,
    priority: Priority,
    started_at: Instant,
}

/// Internal state protected by mutex
struct SchedulerInner {
    /// Pending dispatch requests
    queue: DispatchQueue,

    /// Batch being executed, if any
    in_flight: Option<InFlight>,

    /// Statistics
    stats: SchedulerStats,
}

/// The Scheduler serializes batch execution through one loop with priority
/// ordering and minimum inter-batch spacing.
pub struct Scheduler {
    config: SchedulerConfig,
    inner: Mutex<SchedulerInner>,
    limiter: Mutex<RateLimiter>,
    notify: Notify,
    state: StateManager,
    executor: Arc<dyn BatchExecutor>,
}

impl Scheduler {
    /// Create a new scheduler with the given configuration
    pub fn new(config: SchedulerConfig, state: StateManager, executor: Arc<dyn BatchExecutor>) -> Self {
        debug!(?config, "Scheduler::new: called");
        Self {
            limiter: Mutex::new(RateLimiter::new(config.min_spacing())),
            config,
            inner: Mutex::new(SchedulerInner {
                queue: DispatchQueue::new(),
                in_flight: None,
                stats: SchedulerStats::default(),
            }),
            notify: Notify::new(),
            state,
            executor,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Enqueue one dispatch request per batch id, all sharing the
    /// ingestion's priority and arrival time. Returns the number enqueued.
    pub async fn submit(&self, priority: Priority, arrival_ms: i64, ingestion_id: &str, batch_ids: &[String]) -> usize {
        debug!(%ingestion_id, %priority, arrival_ms, count = batch_ids.len(), "Scheduler::submit: called");
        let mut inner = self.inner.lock().await;
        for batch_id in batch_ids {
            inner.queue.push(priority, arrival_ms, ingestion_id, batch_id);
        }
        inner.stats.total_enqueued += batch_ids.len() as u64;
        inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.queue.len());
        drop(inner);

        // A stored permit covers the case where the loop is not waiting yet
        self.notify.notify_one();
        batch_ids.len()
    }

    /// Pop requests until one claims its batch.
    ///
    /// Entries whose batch is no longer `yet_to_start`, or has no record at
    /// all, are discarded. Returns `None` once the queue is empty.
    pub async fn dispatch_next(&self) -> Result<Option<Batch>, StateError> {
        let mut inner = self.inner.lock().await;
        while let Some(request) = inner.queue.pop() {
            debug!(batch_id = %request.batch_id, priority = %request.priority, "Scheduler::dispatch_next: popped");
            let claimed = self
                .state
                .transition_batch(&request.batch_id, BatchStatus::YetToStart, BatchStatus::Triggered, None)
                .await;

            match claimed {
                Ok(Some(batch)) => {
                    inner.in_flight = Some(InFlight {
                        batch_id: request.batch_id,
                        ingestion_id: request.ingestion_id,
                        priority: request.priority,
                        started_at: Instant::now(),
                    });
                    inner.stats.total_dispatched += 1;
                    return Ok(Some(batch));
                }
                Ok(None) => {
                    debug!(batch_id = %request.batch_id, "Scheduler::dispatch_next: already claimed, discarding");
                    inner.stats.duplicates_discarded += 1;
                }
                Err(StateError::NotFound(what)) => {
                    warn!(batch_id = %request.batch_id, %what, "Queued batch has no record, discarding");
                    inner.stats.orphans_discarded += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Run the scheduler loop until `ct` is cancelled.
    ///
    /// Batch failures become batch state and never stop the loop; only losing
    /// the record store does.
    pub async fn run(&self, ct: CancellationToken) -> Result<()> {
        info!(
            batch_size = self.config.batch_size,
            min_spacing_ms = self.config.min_spacing_ms,
            "Scheduler loop starting"
        );

        while !ct.is_cancelled() {
            self.throttle(&ct).await;
            if ct.is_cancelled() {
                break;
            }

            match self.dispatch_next().await.context("Scheduler lost the record store")? {
                Some(batch) => self.process(batch).await,
                None => self.idle(&ct).await,
            }
        }

        info!("Scheduler loop stopped");
        Ok(())
    }

    /// Sleep out whatever the rate limiter still demands
    async fn throttle(&self, ct: &CancellationToken) {
        let wait = self.limiter.lock().await.wait_interval(Instant::now());
        if wait.is_zero() {
            return;
        }

        debug!(?wait, "Scheduler::throttle: pausing before next dispatch");
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                self.inner.lock().await.stats.total_throttle_ms += wait.as_millis() as u64;
            }
            _ = ct.cancelled() => {}
        }
    }

    /// Wait for an enqueue, the poll fallback, or cancellation
    async fn idle(&self, ct: &CancellationToken) {
        tokio::select! {
            _ = self.notify.notified() => debug!("Scheduler::idle: woken by enqueue"),
            _ = tokio::time::sleep(self.config.idle_poll()) => {}
            _ = ct.cancelled() => {}
        }
    }

    /// Execute one claimed batch and record the outcome
    async fn process(&self, batch: Batch) {
        info!(batch_id = %batch.id, ingestion_id = %batch.ingestion_id, ids = ?batch.ids, "Dispatching batch");

        // Run on its own task so a panicking executor fails the batch, not the loop
        let executor = Arc::clone(&self.executor);
        let ids = batch.ids.clone();
        let outcome = match tokio::spawn(async move { execute_batch(executor.as_ref(), &ids).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(DownstreamError::Aborted(join_error.to_string())),
        };

        let (to, error) = match &outcome {
            Ok(()) => (BatchStatus::Completed, None),
            Err(e) => (BatchStatus::Failed, Some(e.to_string())),
        };

        match self
            .state
            .transition_batch(&batch.id, BatchStatus::Triggered, to, error)
            .await
        {
            Ok(Some(_)) => match &outcome {
                Ok(()) => info!(batch_id = %batch.id, "Batch completed"),
                Err(e) => warn!(batch_id = %batch.id, error = %e, "Batch failed"),
            },
            Ok(None) => warn!(batch_id = %batch.id, %to, "Batch left triggered state during execution"),
            Err(e) => warn!(batch_id = %batch.id, error = %e, "Failed to record batch outcome"),
        }

        self.limiter.lock().await.mark_finished(Instant::now());

        let mut inner = self.inner.lock().await;
        inner.in_flight = None;
        match outcome {
            Ok(()) => inner.stats.total_completed += 1,
            Err(_) => inner.stats.total_failed += 1,
        }
    }

    /// Get current queue state
    pub async fn queue_state(&self) -> QueueState {
        debug!("Scheduler::queue_state: called");
        let rate_limited = !self.limiter.lock().await.wait_interval(Instant::now()).is_zero();
        let inner = self.inner.lock().await;
        let now = Instant::now();

        QueueState {
            queued: inner.queue.len(),
            in_flight: inner.in_flight.as_ref().map(|f| in_flight_entry(f, now)),
            rate_limited,
            stats: inner.stats.clone(),
        }
    }

    /// In-flight batch followed by queued entries in dispatch order
    pub async fn queue_details(&self) -> Vec<QueueEntry> {
        debug!("Scheduler::queue_details: called");
        let inner = self.inner.lock().await;
        let now = Instant::now();

        inner
            .in_flight
            .iter()
            .map(|f| in_flight_entry(f, now))
            .chain(inner.queue.in_order().into_iter().map(|r| QueueEntry {
                batch_id: r.batch_id,
                ingestion_id: r.ingestion_id,
                priority: r.priority,
                status: QueueEntryStatus::Queued,
                wait_time_ms: now.saturating_duration_since(r.enqueued_at).as_millis() as u64,
            }))
            .collect()
    }

    /// Get the scheduler statistics
    pub async fn stats(&self) -> SchedulerStats {
        self.inner.lock().await.stats.clone()
    }
}

fn in_flight_entry(f: &InFlight, now: Instant) -> QueueEntry {
    QueueEntry {
        batch_id: f.batch_id.clone(),
        ingestion_id: f.ingestion_id.clone(),
        priority: f.priority,
        status: QueueEntryStatus::InFlight,
        wait_time_ms: now.saturating_duration_since(f.started_at).as_millis() as u64,
    }
}

/// Call the downstream once per identifier, in order, stopping at the first failure
async fn execute_batch(executor: &dyn BatchExecutor, ids: &[i64]) -> Result<(), DownstreamError> {
    for &id in ids {
        executor.call(id).await?;
    }
    Ok(())
}
