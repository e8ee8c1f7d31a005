//! Dump signal types.

use crate::evaluator::PriceMove;
use crate::rule::RuleDirection;
use chrono::{DateTime, Utc};
use dump_core::{ContractId, Price, TokenView};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A detected price move, ready for notification.
///
/// Created fresh each tick and never mutated afterwards; carries no
/// identity across ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpSignal {
    /// Contract whose price moved.
    pub contract: ContractId,
    /// Token metadata resolved from the registry at detection time.
    pub token: TokenView,
    /// Price at the baseline snapshot.
    pub baseline_price: Price,
    /// Price at the latest snapshot.
    pub current_price: Price,
    /// `current_price - baseline_price`.
    pub price_delta: Price,
    /// Signed change in percent, rounded half-up to 2 dp.
    pub change_percent: Decimal,
    /// Window of the triggering rule.
    pub window: Duration,
    /// Index of the triggering rule in configuration order.
    pub rule_index: usize,
    /// Threshold of the triggering rule.
    pub trigger_percentage: Decimal,
    /// Capture time of the latest snapshot.
    pub detected_at: DateTime<Utc>,
}

impl DumpSignal {
    pub fn from_move(price_move: PriceMove, token: TokenView) -> Self {
        let change_percent = price_move.change_percent();
        Self {
            contract: price_move.contract,
            token,
            baseline_price: price_move.baseline_price,
            current_price: price_move.current_price,
            price_delta: price_move.price_delta,
            change_percent,
            window: price_move.window,
            rule_index: price_move.rule_index,
            trigger_percentage: price_move.trigger_percentage,
            detected_at: price_move.observed_at,
        }
    }

    /// Whether the price fell.
    pub fn is_drop(&self) -> bool {
        self.price_delta.inner().is_sign_negative() && !self.price_delta.is_zero()
    }

    /// Sign of the move, `Drop` or `Rise`.
    pub fn direction(&self) -> RuleDirection {
        if self.is_drop() {
            RuleDirection::Drop
        } else {
            RuleDirection::Rise
        }
    }
}
