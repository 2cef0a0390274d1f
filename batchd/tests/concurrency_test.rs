//! Concurrent enqueue against a running dispatch loop
//!
//! Multi-threaded runtime on real time, with a tiny spacing so the whole
//! backlog drains in well under a second.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

use batchd::domain::{BatchStatus, IngestionStatus, SystemClock};
use batchd::downstream::{BatchExecutor, DownstreamError};
use batchd::ingest::IngestionService;
use batchd::scheduler::{Scheduler, SchedulerConfig};
use batchd::state::StateManager;

const INGESTIONS: i64 = 40;
const IDS_PER_INGESTION: i64 = 7;

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        batch_size: 3,
        min_spacing_ms: 1,
        idle_poll_ms: 10,
    }
}

/// Records every id it is called with
#[derive(Default)]
struct CountingDownstream {
    calls: Mutex<Vec<i64>>,
}

#[async_trait]
impl BatchExecutor for CountingDownstream {
    async fn call(&self, id: i64) -> Result<(), DownstreamError> {
        tokio::task::yield_now().await;
        self.calls.lock().unwrap().push(id);
        Ok(())
    }
}

/// Holds each call until the test hands out a permit
struct GatedDownstream {
    entered: Notify,
    release: Semaphore,
}

impl GatedDownstream {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl BatchExecutor for GatedDownstream {
    async fn call(&self, _id: i64) -> Result<(), DownstreamError> {
        self.entered.notify_one();
        self.release.acquire().await.unwrap().forget();
        Ok(())
    }
}

fn setup(executor: Arc<dyn BatchExecutor>) -> (IngestionService, Arc<Scheduler>) {
    let state = StateManager::spawn();
    let scheduler = Arc::new(Scheduler::new(fast_config(), state.clone(), executor));
    let service = IngestionService::new(state, Arc::clone(&scheduler), Arc::new(SystemClock));
    (service, scheduler)
}

fn start(scheduler: &Arc<Scheduler>, ct: &CancellationToken) -> tokio::task::JoinHandle<eyre::Result<()>> {
    let scheduler = Arc::clone(scheduler);
    let ct = ct.clone();
    tokio::spawn(async move { scheduler.run(ct).await })
}

async fn wait_for_completed(scheduler: &Scheduler, expected: u64) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while scheduler.stats().await.total_completed < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("backlog did not drain in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingests_dispatch_every_id_once() {
    let downstream = Arc::new(CountingDownstream::default());
    let (service, scheduler) = setup(downstream.clone());
    let ct = CancellationToken::new();
    let handle = start(&scheduler, &ct);

    let submitters: Vec<_> = (0..INGESTIONS)
        .map(|n| {
            let service = service.clone();
            let ids: Vec<i64> = (0..IDS_PER_INGESTION).map(|k| n * IDS_PER_INGESTION + k).collect();
            tokio::spawn(async move { service.ingest(ids, "MEDIUM").await.unwrap() })
        })
        .collect();

    let mut ingestion_ids = Vec::new();
    for submitter in submitters {
        ingestion_ids.push(submitter.await.unwrap());
    }

    // 7 ids at batch size 3 is 3 batches per ingestion
    let expected_batches = (INGESTIONS * 3) as u64;
    wait_for_completed(&scheduler, expected_batches).await;

    let calls = downstream.calls.lock().unwrap().clone();
    let unique: HashSet<i64> = calls.iter().copied().collect();
    assert_eq!(calls.len(), (INGESTIONS * IDS_PER_INGESTION) as usize);
    assert_eq!(unique.len(), calls.len());
    assert_eq!(unique, (0..INGESTIONS * IDS_PER_INGESTION).collect::<HashSet<_>>());

    let stats = scheduler.stats().await;
    assert_eq!(stats.total_enqueued, expected_batches);
    assert_eq!(stats.total_dispatched, stats.total_enqueued);
    assert_eq!(stats.duplicates_discarded, 0);
    assert_eq!(stats.orphans_discarded, 0);

    for id in &ingestion_ids {
        assert_eq!(service.status(id).await.unwrap().status, IngestionStatus::Completed);
    }

    ct.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_not_blocked_by_in_flight_batch() {
    let downstream = Arc::new(GatedDownstream::new());
    let (service, scheduler) = setup(downstream.clone());
    let ct = CancellationToken::new();
    let handle = start(&scheduler, &ct);

    let first = service.ingest(vec![1], "LOW").await.unwrap();
    downstream.entered.notified().await;
    assert_eq!(service.status(&first).await.unwrap().status, IngestionStatus::Triggered);

    // The loop is parked inside the downstream call; enqueue must still go through
    let second = tokio::time::timeout(Duration::from_secs(1), service.ingest(vec![2, 3], "HIGH"))
        .await
        .expect("ingest blocked behind the in-flight batch")
        .unwrap();

    let report = service.status(&first).await.unwrap();
    assert_eq!(report.batches[0].status, BatchStatus::Triggered);
    let queue = scheduler.queue_state().await;
    assert_eq!(queue.queued, 1);
    assert!(queue.in_flight.is_some());

    downstream.release.add_permits(3);
    wait_for_completed(&scheduler, 2).await;
    assert_eq!(service.status(&second).await.unwrap().status, IngestionStatus::Completed);

    ct.cancel();
    handle.await.unwrap().unwrap();
}
