//! Main application orchestration.
//!
//! Coordinates all components:
//! - Token catalog (which contracts to price)
//! - Price source (one fetch per tick)
//! - Dump detection engine (fixed-delay tick loop)
//! - Notifier task (drains signals off the engine's path, adds CEX spreads)

use crate::config::AppConfig;
use crate::error::AppResult;
use dump_core::Exchange;
use dump_detector::{
    CexPriceSource, DumpDetectionEngine, DumpSignal, PriceSource, SignalSink, TickReport,
};
use dump_notify::{
    run_notifier, signal_channel, CexEnricher, ChannelSink, LogNotifier, Notifier, TelegramNotifier,
};
use dump_registry::TokenCatalog;
use dump_telemetry::Metrics;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Counters reported when the application stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_completed: u64,
    pub ticks_abandoned: u64,
    pub ticks_skipped: u64,
    pub signals_emitted: u64,
    /// Signals the notifier task handled before it stopped.
    pub signals_delivered: u64,
}

/// Records signal metrics, then forwards to the notification channel.
struct MeteredSink {
    inner: ChannelSink,
}

impl SignalSink for MeteredSink {
    fn publish(&self, signal: DumpSignal) {
        Metrics::signal_raised(signal.rule_index, &signal.direction().to_string());
        self.inner.publish(signal);
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    catalog: Arc<TokenCatalog>,
    engine: DumpDetectionEngine,
    signal_rx: mpsc::Receiver<DumpSignal>,
    notifiers: Vec<Arc<dyn Notifier>>,
    enricher: Option<CexEnricher>,
}

impl Application {
    /// Create a new application with the configured price source.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let source = dump_feed::build_price_source(&config.price_source)?;
        Self::with_source(config, source)
    }

    /// Create a new application around an explicit price source.
    ///
    /// CEX quotes come from the `[cex]` section when present.
    pub fn with_source(config: AppConfig, source: Arc<dyn PriceSource>) -> AppResult<Self> {
        config.validate()?;

        let enricher = match &config.cex {
            Some(cex) => Some(CexEnricher::new(
                dump_feed::build_cex_source(cex)?,
                cex.exchanges.clone(),
            )),
            None => None,
        };

        let catalog = Arc::new(TokenCatalog::with_tokens(
            config.screener.enabled_networks.iter().copied(),
            config.tokens.clone(),
        )?);

        let (channel_sink, signal_rx) = signal_channel(config.notify.channel_capacity);
        let sink = Arc::new(MeteredSink { inner: channel_sink });

        let engine = DumpDetectionEngine::new(config.detector_config(), catalog.clone(), source, sink)?;

        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if config.notify.log {
            notifiers.push(Arc::new(LogNotifier));
        }
        if let Some(telegram) = &config.notify.telegram {
            notifiers.push(Arc::new(TelegramNotifier::new(telegram)?));
        }

        info!(
            tokens = catalog.len(),
            networks = ?catalog.enabled_networks(),
            notifiers = notifiers.len(),
            cex_quotes = enricher.is_some(),
            "Application initialized"
        );

        Ok(Self {
            config,
            catalog,
            engine,
            signal_rx,
            notifiers,
            enricher,
        })
    }

    /// Quote signals with `source`, on the `[cex]` exchanges or every
    /// known exchange when that section is absent.
    pub fn with_cex_source(mut self, source: Arc<dyn CexPriceSource>) -> Self {
        let exchanges = self
            .config
            .cex
            .as_ref()
            .map(|cex| cex.exchanges.clone())
            .unwrap_or_else(|| Exchange::ALL.to_vec());
        self.enricher = Some(CexEnricher::new(source, exchanges));
        self
    }

    /// Token catalog shared with the engine. Replace its contents to
    /// refresh metadata while running.
    pub fn catalog(&self) -> Arc<TokenCatalog> {
        self.catalog.clone()
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> AppResult<RunSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the tick loop until `shutdown` resolves, then drain the
    /// notifier task.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> AppResult<RunSummary> {
        let Self {
            config,
            catalog: _catalog,
            mut engine,
            signal_rx,
            notifiers,
            enricher,
        } = self;

        let notifier_handle = tokio::spawn(run_notifier(signal_rx, notifiers, enricher));
        tokio::pin!(shutdown);

        let initial_delay = config.screener.initial_delay();
        let mut stopped = false;
        if !initial_delay.is_zero() {
            info!(delay_secs = initial_delay.as_secs(), "Waiting before first tick");
            tokio::select! {
                _ = tokio::time::sleep(initial_delay) => {}
                _ = &mut shutdown => stopped = true,
            }
        }

        if !stopped {
            let interval = engine.config().sampling_interval();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "Entering tick loop");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = engine.run_tick().await;
                        record_tick(&engine, &report);
                    }
                    _ = &mut shutdown => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }

        let status = engine.status();
        // dropping the engine drops the last sender, so the notifier drains and stops
        drop(engine);
        let signals_delivered = notifier_handle.await?;

        let summary = RunSummary {
            ticks_completed: status.ticks_completed,
            ticks_abandoned: status.ticks_abandoned,
            ticks_skipped: status.ticks_skipped,
            signals_emitted: status.signals_emitted,
            signals_delivered,
        };
        info!(?summary, "Shut down");
        Ok(summary)
    }
}

fn record_tick(engine: &DumpDetectionEngine, report: &TickReport) {
    Metrics::tick_finished(report.outcome(), report.elapsed().as_secs_f64() * 1000.0);
    if let TickReport::Completed { tracked, priced, .. } = report {
        Metrics::coverage(*tracked, *priced);
    }
    let history_len = engine.history().len();
    Metrics::history_len(history_len);
    debug!(
        outcome = report.outcome(),
        signals = report.signals(),
        history_len,
        "Tick recorded"
    );
}
