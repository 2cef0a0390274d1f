//! Service assembly: record store, scheduler loop and HTTP API under one
//! cancellation token.

use std::sync::Arc;

use axum::Router;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api;
use crate::config::Config;
use crate::domain::{Clock, SystemClock};
use crate::downstream::{BatchExecutor, SimulatedDownstream};
use crate::ingest::IngestionService;
use crate::scheduler::Scheduler;
use crate::state::StateManager;

pub struct Server {
    state: StateManager,
    scheduler: Arc<Scheduler>,
    service: IngestionService,
}

impl Server {
    /// Wire the service against the simulated downstream and wall clock
    pub fn new(config: &Config) -> Self {
        let executor = Arc::new(SimulatedDownstream::new(config.downstream.clone()));
        Self::with_parts(config, executor, Arc::new(SystemClock))
    }

    pub fn with_parts(config: &Config, executor: Arc<dyn BatchExecutor>, clock: Arc<dyn Clock>) -> Self {
        let state = StateManager::spawn();
        let scheduler = Arc::new(Scheduler::new(config.scheduler.clone(), state.clone(), executor));
        let service = IngestionService::new(state.clone(), Arc::clone(&scheduler), clock);
        Self {
            state,
            scheduler,
            service,
        }
    }

    pub fn service(&self) -> &IngestionService {
        &self.service
    }

    pub fn router(&self) -> Router {
        api::router(self.service.clone())
    }

    /// Serve HTTP on `listener` and run the scheduler until `ct` is cancelled.
    ///
    /// Either side exiting cancels the other. An in-flight batch finishes
    /// before the scheduler returns.
    pub async fn run(self, listener: TcpListener, ct: CancellationToken) -> Result<()> {
        let address = listener.local_addr().context("Listener has no local address")?;
        info!(%address, "HTTP server listening");

        let app = self.router();
        let http_fut = async {
            let http_ct = ct.clone();
            let res = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    http_ct.cancelled().await;
                })
                .await
                .context("HTTP server failed");
            info!("HTTP server exited");
            ct.cancel();
            res
        };

        let scheduler_fut = async {
            let res = self.scheduler.run(ct.clone()).await;
            ct.cancel();
            res
        };

        let (http_res, scheduler_res) = tokio::join!(http_fut, scheduler_fut);

        if let Err(e) = self.state.shutdown().await {
            warn!(error = %e, "State manager already stopped");
        }
        http_res.and(scheduler_res)
    }
}
