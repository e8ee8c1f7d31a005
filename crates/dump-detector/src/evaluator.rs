//! Per-rule evaluation.
//!
//! Compares the latest snapshot with the rule's baseline snapshot and
//! reports every contract whose price moved at least the trigger
//! percentage. Pure: reads the history, never mutates it.

use crate::history::SnapshotHistory;
use crate::rule::Rule;
use chrono::{DateTime, Utc};
use dump_core::{round_percent, ContractId, Price};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// A threshold-crossing price move, before token resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMove {
    pub contract: ContractId,
    /// Position of the triggering rule in the configured rule list.
    pub rule_index: usize,
    pub trigger_percentage: Decimal,
    pub window: Duration,
    pub baseline_price: Price,
    pub current_price: Price,
    /// `current - baseline`.
    pub price_delta: Price,
    /// Signed change in percent, unrounded.
    pub raw_change_percent: Decimal,
    /// When the current price was captured.
    pub observed_at: DateTime<Utc>,
}

impl PriceMove {
    /// Signed change rounded half-up to 2 dp, for display.
    pub fn change_percent(&self) -> Decimal {
        round_percent(self.raw_change_percent)
    }
}

/// Evaluates rules against a snapshot history.
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator {
    sampling_interval: Duration,
}

impl RuleEvaluator {
    pub fn new(sampling_interval: Duration) -> Self {
        Self { sampling_interval }
    }

    pub fn sampling_interval(&self) -> Duration {
        self.sampling_interval
    }

    /// Evaluate one rule.
    ///
    /// Returns nothing when the history is empty or no baseline distinct
    /// from the latest snapshot exists. Contracts priced in only one of
    /// the two snapshots, with a zero price in either, or whose change
    /// does not fit in a `Decimal` are skipped.
    /// Output is ordered by contract.
    pub fn evaluate(&self, rule_index: usize, rule: &Rule, history: &SnapshotHistory) -> Vec<PriceMove> {
        let Some(current) = history.latest() else {
            return Vec::new();
        };
        let Some(baseline) = history.snapshot_for_window(rule.time_window(), self.sampling_interval)
        else {
            return Vec::new();
        };
        if Arc::ptr_eq(current, baseline) {
            trace!(rule = %rule, "No baseline distinct from latest snapshot yet");
            return Vec::new();
        }

        let mut moves: Vec<PriceMove> = baseline
            .prices()
            .iter()
            .filter_map(|(contract, &baseline_price)| {
                let current_price = current.price(contract)?;
                if baseline_price.is_zero() || current_price.is_zero() {
                    return None;
                }
                let Some(raw_change_percent) = current_price.pct_from(baseline_price) else {
                    debug!(%contract, %baseline_price, %current_price, "Price change out of range, skipping");
                    return None;
                };
                if !rule.is_triggered_by(raw_change_percent) {
                    return None;
                }
                let price_delta = current_price.checked_sub(baseline_price)?;
                Some(PriceMove {
                    contract: contract.clone(),
                    rule_index,
                    trigger_percentage: rule.trigger_percentage,
                    window: rule.time_window(),
                    baseline_price,
                    current_price,
                    price_delta,
                    raw_change_percent,
                    observed_at: current.captured_at(),
                })
            })
            .collect();

        moves.sort_by(|a, b| a.contract.cmp(&b.contract));
        moves
    }

    /// Evaluate every rule in order and concatenate the results.
    pub fn evaluate_all(&self, rules: &[Rule], history: &SnapshotHistory) -> Vec<PriceMove> {
        rules
            .iter()
            .enumerate()
            .flat_map(|(index, rule)| self.evaluate(index, rule, history))
            .collect()
    }
}
