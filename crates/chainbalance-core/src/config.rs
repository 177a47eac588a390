//! Scan configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::RetryConfig;

/// Invalid [`ScanConfig`] values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Parameters of one scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Addresses per contract call.
    pub batch_size: usize,
    /// Maximum number of batch calls in flight at once.
    pub concurrency: usize,
    pub retry: RetryConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 10,
            retry: RetryConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
