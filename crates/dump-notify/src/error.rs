//! Notification error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Telegram rejected message: {0}")]
    Telegram(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;
