//! chainbalance-core: batched, concurrent, retrying balance scanner.
//!
//! # Overview
//!
//! ChainBalance looks up token balances for large address lists through a
//! single read-only contract method. The core crate defines:
//!
//! - [`ChainQueryClient`]: the async trait every chain adapter implements
//! - [`RetryingBatchCaller`]: fixed-delay retry around one batch call
//! - [`BatchScheduler`]: bounded worker pool dispatching all batches
//! - [`classify`]: merge outcomes and split by non-zero balance
//! - [`ResultExporter`]: write the two result files
//! - [`BalanceScan`]: end-to-end run returning a [`ScanReport`]

pub mod caller;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod policy;
pub mod scan;
pub mod scheduler;
pub mod types;

pub use caller::RetryingBatchCaller;
pub use classify::{classify, ClassifiedResults};
pub use client::ChainQueryClient;
pub use config::{ConfigError, ScanConfig};
pub use error::{ChainCallError, ExportError, ScanError};
pub use export::{ExportedArtifacts, ResultExporter};
pub use policy::{Backoff, RetryConfig, RetryPolicy};
pub use scan::{BalanceScan, ScanReport};
pub use scheduler::{BatchScheduler, Progress};
pub use types::{
    normalize_address, partition, BalanceRecord, Batch, BatchOutcome, DecimalBalance, QueryTarget,
};

pub use alloy_primitives::{Address, U256};
