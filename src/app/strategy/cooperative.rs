//! Cooperative async strategy
//!
//! All units run as tasks on a current-thread tokio runtime and share one
//! async client (and its connection pool). Tasks yield only at I/O: connect,
//! each body chunk, each file write. The runner waits for the whole group
//! before returning.

use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;

use futures::{stream, FutureExt, StreamExt};
use tracing::debug;

use super::{panic_message, worker_count, worker_lost, Batch, StrategyRunner};
use crate::app::client::{AsyncFetcher, ClientConfig};
use crate::app::models::{FetchResult, StrategyKind};
use crate::errors::{StrategyError, StrategyResult};

/// Runs every unit as a task on one single-threaded scheduler
#[derive(Debug, Clone)]
pub struct CooperativeRunner {
    client: ClientConfig,
    max_concurrency: Option<NonZeroUsize>,
}

impl CooperativeRunner {
    /// Create a runner; `None` launches every task at once
    pub fn new(client: ClientConfig, max_concurrency: Option<NonZeroUsize>) -> Self {
        Self {
            client,
            max_concurrency,
        }
    }

    async fn run_tasks(&self, batch: Batch<'_>) -> StrategyResult<Vec<FetchResult>> {
        let fetcher = AsyncFetcher::new(self.client.build_async()?);
        let in_flight = worker_count(self.max_concurrency, batch.locations.len());
        debug!("Launching {} cooperative tasks, {} at a time", batch.locations.len(), in_flight);

        let results = stream::iter(batch.locations.iter())
            .map(|location| {
                let fetcher = &fetcher;
                async move {
                    let unit = fetcher.fetch_unit(batch.namer, location, &batch.clock);
                    let result = match AssertUnwindSafe(unit).catch_unwind().await {
                        Ok(result) => result,
                        Err(payload) => worker_lost(
                            &batch,
                            location,
                            format!("Task panicked: {}", panic_message(payload.as_ref())),
                        ),
                    };
                    batch.reporter.unit_finished(&result);
                    result
                }
            })
            .buffer_unordered(in_flight)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }
}

impl StrategyRunner for CooperativeRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cooperative
    }

    fn run_batch(&self, batch: Batch<'_>) -> StrategyResult<Vec<FetchResult>> {
        if batch.locations.is_empty() {
            return Ok(Vec::new());
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StrategyError::Runtime)?;

        runtime.block_on(self.run_tasks(batch))
    }
}
