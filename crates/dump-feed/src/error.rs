//! Feed error types.

use dump_detector::DetectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("All {batches} {source_name} batches failed, last error: {last_error}")]
    AllBatchesFailed {
        source_name: &'static str,
        batches: usize,
        last_error: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;

impl From<FeedError> for DetectorError {
    fn from(e: FeedError) -> Self {
        DetectorError::FetchFailed(e.to_string())
    }
}
