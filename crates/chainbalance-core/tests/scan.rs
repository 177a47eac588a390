//! End-to-end scans against an in-memory chain client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainbalance_core::client::{normalize_batch, zip_records};
use chainbalance_core::{
    Address, BalanceRecord, BalanceScan, Backoff, ChainCallError, ChainQueryClient, QueryTarget,
    ResultExporter, RetryConfig, ScanConfig, ScanError, U256,
};

const E17: u64 = 100_000_000_000_000_000;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Serves balances from a map; addresses in `broken` always revert.
#[derive(Default)]
struct MemoryChain {
    balances: HashMap<String, U256>,
    broken: Vec<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl ChainQueryClient for MemoryChain {
    async fn query_balances(
        &self,
        _target: &QueryTarget,
        addresses: &[String],
    ) -> Result<Vec<BalanceRecord>, ChainCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let checksummed = normalize_batch(addresses)?;
        if addresses.iter().any(|a| self.broken.contains(a)) {
            return Err(ChainCallError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            });
        }
        let balances = checksummed
            .iter()
            .map(|a| {
                self.balances
                    .get(&a.to_checksum(None))
                    .copied()
                    .unwrap_or(U256::ZERO)
            })
            .collect();
        zip_records(addresses, balances)
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}

fn addr(n: u8) -> String {
    Address::with_last_byte(n).to_checksum(None)
}

fn target() -> QueryTarget {
    QueryTarget {
        contract: Address::ZERO,
        token: Address::ZERO,
        token_id: U256::from(1234567890987654321u64),
    }
}

fn config(batch_size: usize) -> ScanConfig {
    ScanConfig {
        batch_size,
        concurrency: 4,
        retry: RetryConfig {
            max_attempts: 3,
            backoff: Backoff::fixed(Duration::from_secs(5)),
        },
    }
}

// ─── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn three_addresses_end_to_end() {
    let (a1, a2, a3) = (addr(1), addr(2), addr(3));
    let chain = Arc::new(MemoryChain {
        balances: HashMap::from([
            (a1.clone(), U256::from(50 * E17)),
            (a2.clone(), U256::ZERO),
            (a3.clone(), U256::from(3 * E17)),
        ]),
        ..Default::default()
    });
    let scan = BalanceScan::new(chain.clone(), target(), config(50)).unwrap();

    let report = scan.scan(&[a1.clone(), a2.clone(), a3.clone()]).await.unwrap();

    assert_eq!(chain.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.batches, 1);
    assert!(!report.is_partial());

    let dir = tempfile::tempdir().unwrap();
    let with = dir.path().join("with_balance.txt");
    let without = dir.path().join("without_balance.txt");
    ResultExporter::new(&with, &without)
        .export(&report.results)
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&with).unwrap(),
        format!("{a1}: 5.0\n{a3}: 0.3\n")
    );
    assert_eq!(
        std::fs::read_to_string(&without).unwrap(),
        format!("{a2}: 0.0\n")
    );
}

#[tokio::test(start_paused = true)]
async fn empty_input_makes_no_calls() {
    let chain = Arc::new(MemoryChain::default());
    let scan = BalanceScan::new(chain.clone(), target(), config(50)).unwrap();

    let err = scan.scan(&[]).await.unwrap_err();

    assert!(err.is_empty_input());
    assert_eq!(chain.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn partial_failure_reports_reduced_totals() {
    let addrs: Vec<String> = (1..=10).map(addr).collect();
    let chain = Arc::new(MemoryChain {
        balances: HashMap::from([(addrs[0].clone(), U256::from(E17))]),
        broken: vec![addrs[9].clone()],
        ..Default::default()
    });
    let scan = BalanceScan::new(chain.clone(), target(), config(4)).unwrap();

    let report = scan.scan(&addrs).await.unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.failed_batches, 1);
    assert!(report.is_partial());
    assert_eq!(report.results.resolved(), 8);
    assert_eq!(report.results.with_balance.len(), 1);
    assert_eq!(report.results.failed, addrs[8..].to_vec());
    // 2 good batches + 3 attempts on the broken one
    assert_eq!(chain.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn total_failure_is_distinct() {
    let chain = Arc::new(MemoryChain::default());
    let scan = BalanceScan::new(chain, target(), config(2)).unwrap();

    let report = scan
        .scan(&["0xnot-an-address".to_string(), addr(1), addr(2)])
        .await
        .unwrap();
    // only the first batch is malformed
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.results.resolved(), 1);

    let chain = Arc::new(MemoryChain {
        broken: vec![addr(1), addr(3)],
        ..Default::default()
    });
    let scan = BalanceScan::new(chain, target(), config(2)).unwrap();
    let err = scan
        .scan(&[addr(1), addr(2), addr(3)])
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::AllBatchesFailed { batches: 2, .. }));
    assert!(!err.is_empty_input());
}

#[tokio::test(start_paused = true)]
async fn total_failure_keeps_failed_addresses_for_export() {
    let addrs = vec![addr(1), addr(2), addr(3)];
    let chain = Arc::new(MemoryChain {
        broken: addrs.clone(),
        ..Default::default()
    });
    let mut cfg = config(2);
    cfg.retry.max_attempts = 2;
    let scan = BalanceScan::new(chain.clone(), target(), cfg).unwrap();

    let err = scan.scan(&addrs).await.unwrap_err();
    let ScanError::AllBatchesFailed { batches, failed } = err else {
        panic!("expected total failure");
    };
    assert_eq!(batches, 2);
    assert_eq!(failed, addrs);
    assert_eq!(chain.calls.load(Ordering::SeqCst), 4);

    let dir = tempfile::tempdir().unwrap();
    let failed_path = dir.path().join("failed.txt");
    let written = ResultExporter::new(dir.path().join("with.txt"), dir.path().join("without.txt"))
        .with_failed_path(&failed_path)
        .export_failed(&failed)
        .unwrap();

    assert_eq!(written.as_deref(), Some(failed_path.as_path()));
    assert_eq!(
        std::fs::read_to_string(&failed_path).unwrap(),
        format!("{}\n{}\n{}\n", addrs[0], addrs[1], addrs[2])
    );
}

#[tokio::test]
async fn invalid_config_rejected() {
    let chain = Arc::new(MemoryChain::default());
    let result = BalanceScan::new(chain, target(), config(0));
    assert!(matches!(result, Err(ScanError::Config(_))));
}
