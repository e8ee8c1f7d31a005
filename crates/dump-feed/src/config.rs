//! Price source configuration.

use dump_core::Exchange;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 1inch spot-price API base URL.
pub const ONE_INCH_BASE_URL: &str = "https://api.1inch.dev/price/v1.1";
/// DexScreener API base URL.
pub const DEX_SCREENER_BASE_URL: &str = "https://api.dexscreener.com";

/// Addresses per 1inch request.
pub const ONE_INCH_DEFAULT_BATCH: usize = 100;
/// Hard limit of the 1inch spot-price endpoint.
pub const ONE_INCH_MAX_BATCH: usize = 10_000;
/// Hard limit of the DexScreener tokens endpoint.
pub const DEX_SCREENER_MAX_BATCH: usize = 30;

/// DexScreener's published limit for the tokens endpoint.
pub const DEX_SCREENER_REQUESTS_PER_SECOND: u32 = 4;

/// Environment variable holding the 1inch API key.
pub const ONE_INCH_API_KEY_ENV: &str = "ONEINCH_API_KEY";

/// CryptoCompare data API base URL.
pub const CRYPTOCOMPARE_BASE_URL: &str = "https://data-api.cryptocompare.com";
/// Environment variable holding the CryptoCompare API key.
pub const CRYPTOCOMPARE_API_KEY_ENV: &str = "CRYPTOCOMPARE_API_KEY";

/// Which upstream API prices contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSourceKind {
    #[default]
    OneInch,
    DexScreener,
}

impl PriceSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSourceKind::OneInch => "one_inch",
            PriceSourceKind::DexScreener => "dex_screener",
        }
    }
}

/// Configuration for the price source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSourceConfig {
    #[serde(default)]
    pub kind: PriceSourceKind,
    /// Override of the API base URL (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    /// 1inch API key. Falls back to `ONEINCH_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Addresses per request. Defaults per kind.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Concurrent requests in flight.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Request starts allowed per second. Defaults per kind.
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            kind: PriceSourceKind::default(),
            base_url: None,
            api_key: None,
            batch_size: None,
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_ms: default_request_timeout_ms(),
            requests_per_second: None,
        }
    }
}

impl PriceSourceConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - max_concurrent_requests or request_timeout_ms is zero
    /// - batch_size is zero or above the API limit of the selected kind
    /// - requests_per_second is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be positive".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be positive".to_string());
        }
        if self.requests_per_second == Some(0) {
            return Err("requests_per_second must be positive when set".to_string());
        }
        if let Some(size) = self.batch_size {
            let limit = self.max_batch();
            if size == 0 || size > limit {
                return Err(format!(
                    "batch_size must be in 1..={limit} for {}, got {size}",
                    self.kind.as_str()
                ));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.kind) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, PriceSourceKind::OneInch) => ONE_INCH_BASE_URL,
            (None, PriceSourceKind::DexScreener) => DEX_SCREENER_BASE_URL,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(match self.kind {
            PriceSourceKind::OneInch => ONE_INCH_DEFAULT_BATCH,
            PriceSourceKind::DexScreener => DEX_SCREENER_MAX_BATCH,
        })
    }

    /// Request rate cap, `None` for unlimited. DexScreener is capped at
    /// its published limit unless overridden; 1inch limits depend on the
    /// API plan and are only applied when configured.
    pub fn requests_per_second(&self) -> Option<u32> {
        self.requests_per_second.or(match self.kind {
            PriceSourceKind::OneInch => None,
            PriceSourceKind::DexScreener => Some(DEX_SCREENER_REQUESTS_PER_SECOND),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Configured key, or `ONEINCH_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(ONE_INCH_API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    fn max_batch(&self) -> usize {
        match self.kind {
            PriceSourceKind::OneInch => ONE_INCH_MAX_BATCH,
            PriceSourceKind::DexScreener => DEX_SCREENER_MAX_BATCH,
        }
    }
}

/// Configuration for the centralized exchange quote source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CexSourceConfig {
    /// Override of the API base URL (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Falls back to `CRYPTOCOMPARE_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Exchanges quoted for each signal.
    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<Exchange>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_exchanges() -> Vec<Exchange> {
    Exchange::ALL.to_vec()
}

impl Default for CexSourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            exchanges: default_exchanges(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl CexSourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be positive".to_string());
        }
        if self.exchanges.is_empty() {
            return Err("exchanges must not be empty".to_string());
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(CRYPTOCOMPARE_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Configured key, or `CRYPTOCOMPARE_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(CRYPTOCOMPARE_API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}
