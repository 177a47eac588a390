//! `BalanceScan`: one full run: schedule, drain, classify.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::caller::RetryingBatchCaller;
use crate::classify::{classify, ClassifiedResults};
use crate::client::ChainQueryClient;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::policy::RetryPolicy;
use crate::scheduler::{BatchScheduler, Progress};
use crate::types::QueryTarget;

/// Summary of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub results: ClassifiedResults,
    /// Number of batches dispatched.
    pub batches: usize,
    /// Batches that exhausted their retries.
    pub failed_batches: usize,
    /// Wall-clock time of the query phase.
    pub elapsed: Duration,
}

impl ScanReport {
    /// `true` if some, but not all, batches failed.
    pub fn is_partial(&self) -> bool {
        self.failed_batches > 0
    }
}

/// Runs balance scans against one client and target.
pub struct BalanceScan {
    scheduler: BatchScheduler,
    config: ScanConfig,
}

impl BalanceScan {
    pub fn new(
        client: Arc<dyn ChainQueryClient>,
        target: QueryTarget,
        config: ScanConfig,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let caller = RetryingBatchCaller::new(client, target, RetryPolicy::new(config.retry));
        let scheduler = BatchScheduler::new(caller, &config);
        Ok(Self { scheduler, config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Progress of the running scan, one update per completed batch.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.scheduler.subscribe()
    }

    /// Query every address and classify the results.
    ///
    /// Returns [`ScanError::EmptyInput`] without touching the chain when
    /// `addresses` is empty, and [`ScanError::AllBatchesFailed`] (carrying
    /// the failed addresses) when no batch produced data. Partial failure is
    /// a successful report.
    pub async fn scan(&self, addresses: &[String]) -> Result<ScanReport, ScanError> {
        if addresses.is_empty() {
            return Err(ScanError::EmptyInput);
        }

        info!(
            addresses = addresses.len(),
            batch_size = self.config.batch_size,
            concurrency = self.config.concurrency,
            "starting balance scan"
        );
        let start = Instant::now();
        let outcomes = self.scheduler.run(addresses).await;
        let elapsed = start.elapsed();

        let batches = outcomes.len();
        let results = classify(outcomes);
        let failed_batches = results.failed_batches;

        if failed_batches == batches {
            return Err(ScanError::AllBatchesFailed {
                batches,
                failed: results.failed,
            });
        }
        if failed_batches > 0 {
            warn!(
                failed_batches,
                dropped_addresses = results.failed.len(),
                "some batches failed; their addresses are missing from the results"
            );
        }

        info!(
            with_balance = results.with_balance.len(),
            without_balance = results.without_balance.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "balance scan finished"
        );

        Ok(ScanReport {
            results,
            batches,
            failed_batches,
            elapsed,
        })
    }
}
