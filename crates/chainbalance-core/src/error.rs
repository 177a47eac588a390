//! Error types for chain calls, export and whole scans.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a single batch call against the chain.
///
/// Every variant fails the whole batch; partial success inside a batch is
/// not representable.
#[derive(Debug, Error)]
pub enum ChainCallError {
    /// An address could not be parsed into its checksummed form.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC error returned by the node (includes reverts).
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Request timed out after the configured duration.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The call result could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The node returned a different number of balances than requested.
    #[error("expected {expected} balances, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl ChainCallError {
    /// Returns `true` if the error is transient.
    ///
    /// The batch caller retries every error regardless; this only decides
    /// how loudly a retry is logged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Rpc { .. } | Self::Timeout { .. } | Self::Other(_)
        )
    }
}

/// Failure to write a result artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level errors of a [`BalanceScan`](crate::BalanceScan).
#[derive(Debug, Error)]
pub enum ScanError {
    /// No addresses were supplied; nothing was queried.
    #[error("no input addresses")]
    EmptyInput,

    /// Every batch exhausted its retries; there is no data at all.
    ///
    /// `failed` holds every input address, in input order.
    #[error("all {batches} batches failed")]
    AllBatchesFailed { batches: usize, failed: Vec<String> },

    /// The scan configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Writing results failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ScanError {
    /// Returns `true` for the early-exit path (nothing to do).
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}
