//! Detector configuration.

use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How signals from several rules for the same contract are merged
/// within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// One signal per (contract, rule) that fired.
    #[default]
    PerRule,
    /// At most one signal per contract per tick: the largest move,
    /// earliest rule on ties.
    PerContract,
}

/// Configuration for dump detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Scheduling period between ticks, in seconds.
    #[serde(default = "default_sampling_interval_secs")]
    pub sampling_interval_secs: u64,
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub dedup: DedupPolicy,
    /// Soft deadline for the price fetch. Exceeding it abandons the tick.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

fn default_sampling_interval_secs() -> u64 {
    60
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sampling_interval_secs: default_sampling_interval_secs(),
            rules: Vec::new(),
            dedup: DedupPolicy::PerRule,
            fetch_timeout_ms: None,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - sampling interval is zero
    /// - no rules are configured
    /// - any rule has a non-positive threshold or window
    /// - the fetch deadline is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.sampling_interval_secs == 0 {
            return Err("sampling_interval_secs must be positive".to_string());
        }

        if self.rules.is_empty() {
            return Err("at least one rule must be configured".to_string());
        }

        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|e| format!("rules[{index}]: {e}"))?;
        }

        if self.fetch_timeout_ms == Some(0) {
            return Err("fetch_timeout_ms must be positive when set".to_string());
        }

        Ok(())
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(self.sampling_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Longest rule window, zero when no rules are configured.
    pub fn max_window(&self) -> Duration {
        self.rules
            .iter()
            .map(Rule::time_window)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
