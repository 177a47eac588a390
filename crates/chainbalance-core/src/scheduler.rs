//! `BatchScheduler`: bounded worker pool over all batches of a scan.
//!
//! ```text
//! addresses ─partition─▶ [job queue, cap = concurrency] ─▶ worker 0..N ─▶ [results] ─▶ collector
//!                                                             │
//!                                                   RetryingBatchCaller
//! ```
//!
//! At most `concurrency` workers exist, and each runs one batch (with all of
//! its retries) to completion before taking the next, so no more than
//! `concurrency` calls are ever in flight. `run` returns only once every
//! worker has exited.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info};

use crate::caller::RetryingBatchCaller;
use crate::config::ScanConfig;
use crate::types::{partition, Batch, BatchOutcome};

/// Snapshot of scan progress, published once per completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Completed batches that exhausted their retries.
    pub failed: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Batch>>>;

/// Partitions addresses and dispatches the batches to a bounded worker pool.
pub struct BatchScheduler {
    caller: RetryingBatchCaller,
    batch_size: usize,
    concurrency: usize,
    progress: watch::Sender<Progress>,
}

impl BatchScheduler {
    pub fn new(caller: RetryingBatchCaller, config: &ScanConfig) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            caller,
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
            progress,
        }
    }

    /// Subscribe to progress updates. Observers never slow the workers down;
    /// a slow observer simply sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Query every batch of `addresses` and return one outcome per batch,
    /// in completion order.
    pub async fn run(&self, addresses: &[String]) -> Vec<BatchOutcome> {
        let batches = partition(addresses, self.batch_size);
        let total = batches.len();
        self.progress.send_replace(Progress {
            total,
            ..Progress::default()
        });
        if total == 0 {
            return Vec::new();
        }

        let workers = self.concurrency.min(total);
        info!(
            addresses = addresses.len(),
            batches = total,
            workers,
            "dispatching batches"
        );

        let (job_tx, job_rx) = mpsc::channel::<Batch>(self.concurrency);
        let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<BatchOutcome>();

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let jobs = Arc::clone(&job_rx);
                let results = result_tx.clone();
                let caller = self.caller.clone();
                tokio::spawn(worker_loop(worker, jobs, results, caller))
            })
            .collect();
        // Only workers may keep the queue and result channel alive.
        drop(job_rx);
        drop(result_tx);

        let jobs = batches.clone();
        let feed = async move {
            for batch in jobs {
                if job_tx.send(batch).await.is_err() {
                    // every worker is gone
                    break;
                }
            }
        };

        let progress_tx = &self.progress;
        let collect = async move {
            let mut outcomes = Vec::with_capacity(total);
            let mut progress = Progress {
                total,
                ..Progress::default()
            };
            while let Some(outcome) = result_rx.recv().await {
                progress.completed += 1;
                if outcome.is_exhausted() {
                    progress.failed += 1;
                }
                progress_tx.send_replace(progress);
                debug!(
                    batch = outcome.index(),
                    completed = progress.completed,
                    total,
                    "batch completed"
                );
                outcomes.push(outcome);
            }
            (outcomes, progress)
        };

        let ((), (mut outcomes, mut progress)) = tokio::join!(feed, collect);

        for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!(worker, error = %e, "worker task died");
            }
        }

        if outcomes.len() < total {
            let mut seen = vec![false; total];
            for outcome in &outcomes {
                seen[outcome.index()] = true;
            }
            for batch in batches.into_iter().filter(|b| !seen[b.index]) {
                error!(batch = batch.index, "batch lost with its worker, marking as failed");
                progress.completed += 1;
                progress.failed += 1;
                outcomes.push(BatchOutcome::Exhausted(batch));
            }
            self.progress.send_replace(progress);
        }

        info!(
            batches = total,
            failed = progress.failed,
            "all batches completed"
        );
        outcomes
    }
}

async fn worker_loop(
    worker: usize,
    jobs: JobQueue,
    results: mpsc::UnboundedSender<BatchOutcome>,
    caller: RetryingBatchCaller,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(batch) = next else {
            break;
        };
        debug!(worker, batch = batch.index, size = batch.len(), "worker picked batch");
        let outcome = caller.call_with_retry(batch).await;
        if results.send(outcome).is_err() {
            break;
        }
    }
}
