//! Merge batch outcomes and split addresses by whether they hold a balance.

use serde::Serialize;

use crate::types::{BatchOutcome, DecimalBalance};

/// Addresses grouped by balance, each group in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedResults {
    /// Decimal balance greater than zero.
    #[serde(serialize_with = "serialize_pairs")]
    pub with_balance: Vec<(String, DecimalBalance)>,
    /// Decimal balance of exactly zero.
    #[serde(serialize_with = "serialize_pairs")]
    pub without_balance: Vec<(String, DecimalBalance)>,
    /// Addresses whose batch exhausted its retries. They appear in neither
    /// balance group.
    pub failed: Vec<String>,
    /// Number of batches behind `failed`.
    pub failed_batches: usize,
}

impl ClassifiedResults {
    /// Number of addresses with a known balance.
    pub fn resolved(&self) -> usize {
        self.with_balance.len() + self.without_balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved() == 0 && self.failed.is_empty()
    }
}

fn serialize_pairs<S>(pairs: &[(String, DecimalBalance)], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = s.serialize_map(Some(pairs.len()))?;
    for (address, balance) in pairs {
        map.serialize_entry(address, &balance.to_string())?;
    }
    map.end()
}

/// Flatten all outcomes and partition the records at the fixed 10^18 scale.
///
/// Outcomes are ordered by batch index first, so the result does not depend
/// on the order in which batches completed.
pub fn classify(mut outcomes: Vec<BatchOutcome>) -> ClassifiedResults {
    outcomes.sort_by_key(BatchOutcome::index);

    let mut results = ClassifiedResults::default();
    for outcome in outcomes {
        match outcome {
            BatchOutcome::Fetched { records, .. } => {
                for record in records {
                    let balance = record.decimal();
                    if balance.is_positive() {
                        results.with_balance.push((record.address, balance));
                    } else {
                        results.without_balance.push((record.address, balance));
                    }
                }
            }
            BatchOutcome::Exhausted(batch) => {
                results.failed_batches += 1;
                results.failed.extend(batch.addresses);
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BalanceRecord, Batch};
    use alloy_primitives::U256;
    use std::collections::HashSet;

    const E18: u64 = 1_000_000_000_000_000_000;

    fn fetched(index: usize, recs: &[(&str, u64)]) -> BatchOutcome {
        BatchOutcome::Fetched {
            index,
            records: recs
                .iter()
                .map(|(a, raw)| BalanceRecord::new(*a, U256::from(*raw)))
                .collect(),
        }
    }

    #[test]
    fn splits_on_positive_balance() {
        let results = classify(vec![fetched(0, &[("a", 5 * E18), ("b", 0), ("c", E18 / 10 * 3)])]);
        let with: Vec<(&str, String)> = results
            .with_balance
            .iter()
            .map(|(a, b)| (a.as_str(), b.to_string()))
            .collect();
        assert_eq!(with, vec![("a", "5.0".to_string()), ("c", "0.3".to_string())]);
        assert_eq!(results.without_balance.len(), 1);
        assert_eq!(results.without_balance[0].0, "b");
        assert_eq!(results.without_balance[0].1.to_string(), "0.0");
    }

    #[test]
    fn groups_are_disjoint_and_cover_fetched() {
        let outcomes = vec![
            fetched(2, &[("e", 1), ("f", 0)]),
            fetched(0, &[("a", 0), ("b", E18)]),
            BatchOutcome::Exhausted(Batch {
                index: 1,
                addresses: vec!["c".into(), "d".into()],
            }),
        ];
        let results = classify(outcomes);

        let with: HashSet<_> = results.with_balance.iter().map(|(a, _)| a.clone()).collect();
        let without: HashSet<_> = results.without_balance.iter().map(|(a, _)| a.clone()).collect();
        assert!(with.is_disjoint(&without));
        assert_eq!(results.resolved(), 4);
        assert_eq!(results.failed, vec!["c".to_string(), "d".to_string()]);
        assert_eq!(results.failed_batches, 1);
        // batch order restored
        assert_eq!(results.with_balance[0].0, "b");
        assert_eq!(results.without_balance[0].0, "a");
    }

    #[test]
    fn empty_outcomes() {
        assert!(classify(Vec::new()).is_empty());
    }
}
