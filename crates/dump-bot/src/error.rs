//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] dump_feed::FeedError),

    #[error("Registry error: {0}")]
    Registry(#[from] dump_registry::RegistryError),

    #[error("Detector error: {0}")]
    Detector(#[from] dump_detector::DetectorError),

    #[error("Notify error: {0}")]
    Notify(#[from] dump_notify::NotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] dump_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notifier task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type AppResult<T> = Result<T, AppError>;
