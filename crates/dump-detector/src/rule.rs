//! Detection rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which sign of price move a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    /// Any move with `|change| >= trigger`.
    #[default]
    Both,
    /// Only falls: `change <= -trigger`.
    Drop,
    /// Only rises: `change >= trigger`.
    Rise,
}

impl fmt::Display for RuleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDirection::Both => write!(f, "both"),
            RuleDirection::Drop => write!(f, "drop"),
            RuleDirection::Rise => write!(f, "rise"),
        }
    }
}

/// One independent detection criterion: a move of at least
/// `trigger_percentage` within `window_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Threshold in percent (e.g. `30` for 30%). Must be positive.
    pub trigger_percentage: Decimal,
    /// Look-back window in seconds. Must be positive.
    pub window_secs: u64,
    #[serde(default)]
    pub direction: RuleDirection,
}

impl Rule {
    pub fn new(trigger_percentage: Decimal, window: Duration) -> Self {
        Self {
            trigger_percentage,
            window_secs: window.as_secs(),
            direction: RuleDirection::Both,
        }
    }

    pub fn with_direction(mut self, direction: RuleDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn time_window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Whether an unrounded signed change crosses this rule's threshold.
    pub fn is_triggered_by(&self, change_pct: Decimal) -> bool {
        match self.direction {
            RuleDirection::Both => change_pct.abs() >= self.trigger_percentage,
            RuleDirection::Drop => -change_pct >= self.trigger_percentage,
            RuleDirection::Rise => change_pct >= self.trigger_percentage,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trigger_percentage <= Decimal::ZERO {
            return Err(format!(
                "trigger_percentage ({}) must be positive",
                self.trigger_percentage
            ));
        }
        if self.window_secs == 0 {
            return Err("window_secs must be positive".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}%/{}s ({})",
            self.trigger_percentage, self.window_secs, self.direction
        )
    }
}
