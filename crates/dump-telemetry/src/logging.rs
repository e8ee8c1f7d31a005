//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,dump=debug";

/// Initialize structured logging with the default filter.
///
/// JSON output when `RUST_ENV=production`, pretty output otherwise.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(DEFAULT_FILTER, None)
}

/// Initialize structured logging.
///
/// `RUST_LOG` still takes precedence over `default_filter`. `json`
/// forces the output format; `None` falls back to `RUST_ENV`.
pub fn init_logging_with(default_filter: &str, json: Option<bool>) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let is_production = json.unwrap_or_else(|| {
        std::env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    });

    let result = if is_production {
        // JSON format for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        // Pretty format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
