//! Dump screener entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "DUMP_SCREENER_CONFIG";

/// Watches token prices and alerts on sharp moves.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DUMP_SCREENER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = dump_bot::AppConfig::from_file(&config_path)?;

    dump_telemetry::init_logging_with(&config.telemetry.log_filter, config.telemetry.json)?;

    info!("Starting dump screener v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        rules = config.rules.len(),
        tokens = config.tokens.len(),
        source = config.price_source.kind.as_str(),
        "Configuration loaded"
    );

    config.validate()?;

    let app = dump_bot::Application::new(config)?;
    let summary = app.run().await?;

    info!(
        ticks = summary.ticks_completed,
        signals = summary.signals_emitted,
        "Stopped"
    );
    Ok(())
}
