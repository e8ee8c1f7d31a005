//! Detector error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Price fetch failed: {0}")]
    FetchFailed(String),

    #[error("Price fetch exceeded {0}ms deadline")]
    FetchTimeout(u64),

    #[error("Snapshot out of order: {captured_at} is not after {latest}")]
    OutOfOrderSnapshot { captured_at: String, latest: String },
}

pub type DetectorResult<T> = Result<T, DetectorError>;
