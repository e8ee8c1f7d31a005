//! Price snapshots.

use chrono::{DateTime, Utc};
use dump_core::{ContractId, Price};
use std::collections::HashMap;

/// Sparse contract -> USD price map. A contract that could not be
/// priced is absent, never mapped to zero.
pub type PriceMap = HashMap<ContractId, Price>;

/// Prices of all tracked contracts captured in one tick.
///
/// Immutable once built; the history shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    captured_at: DateTime<Utc>,
    prices: PriceMap,
}

impl PriceSnapshot {
    pub fn new(captured_at: DateTime<Utc>, prices: PriceMap) -> Self {
        Self {
            captured_at,
            prices,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn price(&self, contract: &ContractId) -> Option<Price> {
        self.prices.get(contract).copied()
    }

    pub fn prices(&self) -> &PriceMap {
        &self.prices
    }

    /// Number of priced contracts.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
