//! End-to-end tests over a real listener with the HTTP client

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use batchd::client::{ApiClient, ClientError};
use batchd::config::{ClientConfig, Config};
use batchd::domain::SystemClock;
use batchd::downstream::{DownstreamConfig, SimulatedDownstream};
use batchd::scheduler::SchedulerConfig;
use batchd::server::Server;

fn fast_config() -> Config {
    Config {
        scheduler: SchedulerConfig {
            batch_size: 2,
            min_spacing_ms: 50,
            idle_poll_ms: 20,
        },
        downstream: DownstreamConfig {
            call_delay_ms: 5,
            jitter_ms: 0,
            failure_rate: 0.0,
        },
        ..Default::default()
    }
}

async fn start(config: Config) -> (ApiClient, CancellationToken, tokio::task::JoinHandle<eyre::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let executor = Arc::new(SimulatedDownstream::new(config.downstream.clone()));
    let server = Server::with_parts(&config, executor, Arc::new(SystemClock));
    let ct = CancellationToken::new();
    let handle = tokio::spawn(server.run(listener, ct.clone()));

    let client = ApiClient::new(&ClientConfig {
        server_url: format!("http://{address}"),
        timeout_ms: 2_000,
    })
    .unwrap();
    (client, ct, handle)
}

#[tokio::test]
async fn test_submit_and_poll_until_completed() {
    let (client, ct, handle) = start(fast_config()).await;

    let id = client.submit(vec![1, 2, 3, 4, 5], "high").await.unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let report = client.status(&id).await.unwrap();
            if report["status"] == "completed" {
                return report;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("ingestion did not complete in time");

    assert_eq!(report["priority"], "HIGH");
    assert_eq!(report["batches"].as_array().unwrap().len(), 3);

    ct.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_client_errors() {
    let (client, ct, handle) = start(fast_config()).await;

    let err = client.submit(vec![1], "URGENT").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(ref msg) if msg.contains("invalid priority")), "{err}");

    let err = client.submit(vec![], "LOW").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected(_)), "{err}");

    let err = client.status("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err}");

    ct.cancel();
    handle.await.unwrap().unwrap();
}
