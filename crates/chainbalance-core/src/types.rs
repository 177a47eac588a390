//! Domain types: batches, balance records and decimal balances.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};

use crate::error::ChainCallError;

/// Fixed decimal scale of every queried token (10^18).
const DECIMALS: usize = 18;

const SCALE: u64 = 1_000_000_000_000_000_000;

/// The contract method and token every batch in a run is queried against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTarget {
    /// Balance-reader contract exposing `getTokenBalances`.
    pub contract: Address,
    /// Token contract whose balances are read.
    pub token: Address,
    /// Token id passed through to the reader.
    pub token_id: U256,
}

/// A contiguous slice of the input address list, queried in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in the input.
    pub index: usize,
    pub addresses: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Split `addresses` into consecutive batches of at most `batch_size`.
///
/// The batches cover the input exactly once, in order; only the last one
/// may be shorter. A `batch_size` of zero is treated as one.
pub fn partition(addresses: &[String], batch_size: usize) -> Vec<Batch> {
    addresses
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            addresses: chunk.to_vec(),
        })
        .collect()
}

/// Parse an address in any hex casing and return it in canonical form.
///
/// The returned [`Address`] displays as its EIP-55 checksum.
pub fn normalize_address(raw: &str) -> Result<Address, ChainCallError> {
    let trimmed = raw.trim();
    Address::from_str(trimmed).map_err(|e| ChainCallError::InvalidAddress {
        address: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Raw balance of one address in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    /// The address exactly as it was supplied by the caller.
    pub address: String,
    pub raw: U256,
}

impl BalanceRecord {
    pub fn new(address: impl Into<String>, raw: U256) -> Self {
        Self {
            address: address.into(),
            raw,
        }
    }

    pub fn decimal(&self) -> DecimalBalance {
        DecimalBalance::from_raw(self.raw)
    }
}

/// Result of one batch after all of its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The call succeeded; one record per address, in batch order.
    Fetched {
        index: usize,
        records: Vec<BalanceRecord>,
    },
    /// Every attempt failed. No records exist for this batch.
    Exhausted(Batch),
}

impl BatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Fetched { index, .. } => *index,
            Self::Exhausted(batch) => batch.index,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// The fetched records, or `None` for an exhausted batch.
    pub fn records(&self) -> Option<&[BalanceRecord]> {
        match self {
            Self::Fetched { records, .. } => Some(records),
            Self::Exhausted(_) => None,
        }
    }
}

/// A raw balance divided by 10^18, rendered without floating point loss.
///
/// Formats as `<integer>.<fraction>` with trailing zeros trimmed and at
/// least one fractional digit: `10^18` is `1.0`, `3 * 10^17` is `0.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalBalance {
    raw: U256,
}

impl DecimalBalance {
    pub fn from_raw(raw: U256) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn is_positive(&self) -> bool {
        !self.raw.is_zero()
    }
}

impl fmt::Display for DecimalBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = U256::from(SCALE);
        let whole = self.raw / scale;
        // remainder < 10^18 always fits in the low limb
        let frac = (self.raw % scale).as_limbs()[0];
        let digits = format!("{frac:0width$}", width = DECIMALS);
        let digits = digits.trim_end_matches('0');
        if digits.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{digits}")
        }
    }
}
