//! `RetryingBatchCaller`: bounded retry-with-delay around one batch call.
//!
//! Each attempt yields a `Result` that drives a small state machine:
//!
//! ```text
//! Attempting(1) ──err──▶ sleep ──▶ Attempting(2) ── … ──err──▶ Exhausted
//!       │                                │
//!       └──ok──────────▶ Succeeded ◀─────┘
//! ```
//!
//! No error ever leaves this component; an exhausted batch becomes
//! [`BatchOutcome::Exhausted`].

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::client::ChainQueryClient;
use crate::policy::RetryPolicy;
use crate::types::{BalanceRecord, Batch, BatchOutcome, QueryTarget};

enum RetryState {
    Attempting(u32),
    Succeeded(Vec<BalanceRecord>),
    Exhausted,
}

/// Calls a [`ChainQueryClient`] for one batch, retrying failed attempts.
///
/// The worker running a batch is held for the whole call, including the
/// pauses between attempts.
#[derive(Clone)]
pub struct RetryingBatchCaller {
    client: Arc<dyn ChainQueryClient>,
    target: QueryTarget,
    policy: RetryPolicy,
}

impl RetryingBatchCaller {
    pub fn new(client: Arc<dyn ChainQueryClient>, target: QueryTarget, policy: RetryPolicy) -> Self {
        Self {
            client,
            target,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Query `batch` until it succeeds or the attempts run out.
    pub async fn call_with_retry(&self, batch: Batch) -> BatchOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    match self
                        .client
                        .query_balances(&self.target, &batch.addresses)
                        .await
                    {
                        Ok(records) => RetryState::Succeeded(records),
                        Err(e) => match self.policy.next_delay(attempt) {
                            Some(delay) => {
                                warn!(
                                    batch = batch.index,
                                    attempt,
                                    max_attempts,
                                    delay_ms = delay.as_millis() as u64,
                                    retryable = e.is_retryable(),
                                    error = %e,
                                    endpoint = self.client.endpoint(),
                                    "batch query failed, retrying"
                                );
                                tokio::time::sleep(delay).await;
                                RetryState::Attempting(attempt + 1)
                            }
                            None => {
                                error!(
                                    batch = batch.index,
                                    attempt,
                                    addresses = batch.len(),
                                    error = %e,
                                    endpoint = self.client.endpoint(),
                                    "batch query failed, giving up"
                                );
                                RetryState::Exhausted
                            }
                        },
                    }
                }
                RetryState::Succeeded(records) => {
                    debug!(batch = batch.index, records = records.len(), "batch fetched");
                    return BatchOutcome::Fetched {
                        index: batch.index,
                        records,
                    };
                }
                RetryState::Exhausted => return BatchOutcome::Exhausted(batch),
            };
        }
    }
}
