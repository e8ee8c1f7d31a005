//! Application configuration.

use crate::error::{AppError, AppResult};
use dump_core::{Network, TokenView};
use dump_detector::{DedupPolicy, DetectorConfig, Rule};
use dump_feed::{CexSourceConfig, PriceSourceConfig};
use dump_notify::NotifyConfig;
use dump_telemetry::DEFAULT_FILTER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduling and detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Delay between the end of one tick and the start of the next.
    #[serde(default = "default_sampling_interval_secs")]
    pub sampling_interval_secs: u64,
    /// Wait before the first tick.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default)]
    pub dedup: DedupPolicy,
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
    /// Networks whose contracts are priced. Others are ignored.
    #[serde(default = "default_enabled_networks")]
    pub enabled_networks: Vec<Network>,
}

fn default_sampling_interval_secs() -> u64 {
    60
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_enabled_networks() -> Vec<Network> {
    Network::ALL.to_vec()
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            sampling_interval_secs: default_sampling_interval_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            dedup: DedupPolicy::default(),
            fetch_timeout_ms: None,
            enabled_networks: default_enabled_networks(),
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled_networks.is_empty() {
            return Err("screener.enabled_networks must not be empty".to_string());
        }
        Ok(())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Force JSON (`true`) or pretty (`false`) output. Unset follows `RUST_ENV`.
    #[serde(default)]
    pub json: Option<bool>,
}

fn default_log_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub screener: ScreenerConfig,
    /// Detection rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub price_source: PriceSourceConfig,
    /// CEX spread quotes in notifications. Off when absent.
    #[serde(default)]
    pub cex: Option<CexSourceConfig>,
    /// Initial token catalog.
    #[serde(default)]
    pub tokens: Vec<TokenView>,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.screener.validate().map_err(AppError::Config)?;
        self.detector_config().validate().map_err(AppError::Config)?;
        self.price_source
            .validate()
            .map_err(|e| AppError::Config(format!("price_source: {e}")))?;
        if let Some(cex) = &self.cex {
            cex.validate().map_err(|e| AppError::Config(format!("cex: {e}")))?;
        }
        self.notify
            .validate()
            .map_err(|e| AppError::Config(format!("notify: {e}")))?;
        Ok(())
    }

    /// Detector settings assembled from `[screener]` and `[[rules]]`.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            sampling_interval_secs: self.screener.sampling_interval_secs,
            rules: self.rules.clone(),
            dedup: self.screener.dedup,
            fetch_timeout_ms: self.screener.fetch_timeout_ms,
        }
    }
}
