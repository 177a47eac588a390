//! The `ChainQueryClient` trait: the seam between the scan engine and a chain.

use async_trait::async_trait;

use crate::error::ChainCallError;
use crate::types::{normalize_address, BalanceRecord, QueryTarget};
use alloy_primitives::Address;

/// Reads balances for one batch of addresses in a single round trip.
///
/// # Contract
/// - every address must normalize to its checksummed form, otherwise the
///   whole call fails with [`ChainCallError::InvalidAddress`];
/// - on success the returned records are in the same order as `addresses`,
///   one per address;
/// - implementations do not retry; that is the job of
///   [`RetryingBatchCaller`](crate::RetryingBatchCaller).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` and are shared across the worker
/// pool as `Arc<dyn ChainQueryClient>`.
#[async_trait]
pub trait ChainQueryClient: Send + Sync + 'static {
    async fn query_balances(
        &self,
        target: &QueryTarget,
        addresses: &[String],
    ) -> Result<Vec<BalanceRecord>, ChainCallError>;

    /// The endpoint identifier (URL or name), used in logs.
    fn endpoint(&self) -> &str;
}

/// Normalize a whole batch, failing on the first bad address.
pub fn normalize_batch(addresses: &[String]) -> Result<Vec<Address>, ChainCallError> {
    addresses.iter().map(|a| normalize_address(a)).collect()
}

/// Zip caller addresses with returned balances, checking the lengths agree.
pub fn zip_records(
    addresses: &[String],
    balances: Vec<alloy_primitives::U256>,
) -> Result<Vec<BalanceRecord>, ChainCallError> {
    if balances.len() != addresses.len() {
        return Err(ChainCallError::LengthMismatch {
            expected: addresses.len(),
            actual: balances.len(),
        });
    }
    Ok(addresses
        .iter()
        .zip(balances)
        .map(|(address, raw)| BalanceRecord::new(address.clone(), raw))
        .collect())
}
