//! HTTP price sources for the dump screener.
//!
//! Two interchangeable [`PriceSource`] implementations:
//! - [`OneInchPriceSource`]: 1inch spot-price API, priced per chain
//! - [`DexScreenerPriceSource`]: DexScreener pairs API, most liquid pair wins
//!
//! Both group contracts by network, split them into batches, and run the
//! batches with bounded concurrency and an optional request rate cap.
//! Failed batches degrade to a partial result; only a total failure is
//! reported as an error.
//!
//! [`CryptoCompareCexSource`] quotes centralized exchange prices used for
//! the spread section of notifications.

pub mod batch;
pub mod config;
pub mod cryptocompare;
pub mod dex_screener;
pub mod error;
pub mod one_inch;
pub mod rate_limit;

pub use config::{CexSourceConfig, PriceSourceConfig, PriceSourceKind};
pub use cryptocompare::CryptoCompareCexSource;
pub use dex_screener::DexScreenerPriceSource;
pub use error::{FeedError, FeedResult};
pub use one_inch::OneInchPriceSource;
pub use rate_limit::RequestLimiter;

use dump_detector::{CexPriceSource, PriceSource};
use std::sync::Arc;
use tracing::info;

/// Build the price source selected by `config.kind`.
pub fn build_price_source(config: &PriceSourceConfig) -> FeedResult<Arc<dyn PriceSource>> {
    config.validate().map_err(FeedError::Config)?;

    info!(
        kind = config.kind.as_str(),
        base_url = config.base_url(),
        batch_size = config.batch_size(),
        max_concurrent = config.max_concurrent_requests,
        requests_per_second = ?config.requests_per_second(),
        "Price source configured"
    );

    let source: Arc<dyn PriceSource> = match config.kind {
        PriceSourceKind::OneInch => Arc::new(OneInchPriceSource::new(config)?),
        PriceSourceKind::DexScreener => Arc::new(DexScreenerPriceSource::new(config)?),
    };
    Ok(source)
}

/// Build the centralized exchange quote source.
pub fn build_cex_source(config: &CexSourceConfig) -> FeedResult<Arc<dyn CexPriceSource>> {
    info!(
        base_url = config.base_url(),
        exchanges = ?config.exchanges,
        "CEX quote source configured"
    );
    Ok(Arc::new(CryptoCompareCexSource::new(config)?))
}
