//! Thread-per-unit strategy
//!
//! Workers are scoped OS threads. Each worker builds its own blocking HTTP
//! client, so every thread drives its own connections and nothing but the
//! output directory and the reporter is shared. Each worker reports its own result the moment it finishes; the runner collects
//! results over a channel, so they arrive in completion order.

use std::num::NonZeroUsize;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use super::{run_isolated, worker_count, worker_lost, Batch, StrategyRunner, UnitQueue};
use crate::app::client::{BlockingFetcher, ClientConfig};
use crate::app::models::{FetchResult, StrategyKind};
use crate::errors::StrategyResult;

/// Runs every unit on its own OS thread
#[derive(Debug, Clone)]
pub struct ThreadPoolRunner {
    client: ClientConfig,
    max_concurrency: Option<NonZeroUsize>,
}

impl ThreadPoolRunner {
    /// Create a runner; `None` starts one thread per unit
    pub fn new(client: ClientConfig, max_concurrency: Option<NonZeroUsize>) -> Self {
        Self {
            client,
            max_concurrency,
        }
    }
}

impl StrategyRunner for ThreadPoolRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Threads
    }

    fn run_batch(&self, batch: Batch<'_>) -> StrategyResult<Vec<FetchResult>> {
        if batch.locations.is_empty() {
            return Ok(Vec::new());
        }

        // Invalid settings abort the strategy before any unit starts
        drop(self.client.build_blocking()?);

        let queue = UnitQueue::new(batch.locations);
        let workers = worker_count(self.max_concurrency, batch.locations.len());
        debug!("Starting {} worker threads", workers);

        let mut results = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let mut handles = Vec::with_capacity(workers);

            for worker_id in 0..workers {
                let tx = tx.clone();
                let client = &self.client;
                let queue = &queue;
                let spawned = thread::Builder::new()
                    .name(format!("fetch-worker-{}", worker_id))
                    .spawn_scoped(scope, move || {
                        let fetcher = match client.build_blocking() {
                            Ok(client) => BlockingFetcher::new(client),
                            Err(e) => {
                                warn!("Worker {} could not build its client: {}", worker_id, e);
                                return;
                            }
                        };
                        while let Some((_, location)) = queue.claim() {
                            let result = run_isolated(&batch, location, || {
                                fetcher.fetch_unit(batch.namer, location, &batch.clock)
                            });
                            batch.reporter.unit_finished(&result);
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => warn!("Failed to start worker thread {}: {}", worker_id, e),
                }
            }
            drop(tx);

            let results: Vec<FetchResult> = rx.iter().collect();
            for handle in handles {
                if handle.join().is_err() {
                    warn!("Worker thread terminated abnormally");
                }
            }
            results
        });

        // Units left unclaimed because no worker could start
        while let Some((_, location)) = queue.claim() {
            let result = worker_lost(&batch, location, "No worker thread available".to_string());
            batch.reporter.unit_finished(&result);
            results.push(result);
        }

        Ok(results)
    }
}
