//! Retry policy for batch calls: fixed delay by default, exponential opt-in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long to pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// The same pause before every retry.
    Fixed { delay: Duration },
    /// `initial * multiplier^(n-1)` before the n-th retry, capped at `max`.
    ///
    /// Changes the worst-case latency of a batch from
    /// `(attempts - 1) * delay` to the sum of the growing delays.
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }
}

/// Configuration for the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts per batch, the first one included.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::fixed(Duration::from_secs(5)),
        }
    }
}

/// Stateless retry policy: computes the next delay given the attempt number.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Attempts allowed per batch; never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Returns the pause after the `attempt`-th failure (1-based), or
    /// `None` when that attempt was the last one.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts() {
            return None;
        }
        match self.config.backoff {
            Backoff::Fixed { delay } => Some(delay),
            Backoff::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let base_ms = initial.as_millis() as f64 * multiplier.powi((attempt - 1) as i32);
                let capped = base_ms.min(max.as_millis() as f64);
                Some(Duration::from_millis(capped as u64))
            }
        }
    }

    /// Sum of all pauses a batch can spend waiting before it is given up.
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.max_attempts())
            .filter_map(|attempt| self.next_delay(attempt))
            .sum()
    }
}
