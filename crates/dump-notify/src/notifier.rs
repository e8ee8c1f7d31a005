//! Notifier trait and the delivery task.

use crate::error::NotifyResult;
use crate::format::{render_signal, summary_line};
use crate::spread::CexEnricher;
use chrono::Utc;
use dump_detector::{BoxFuture, DumpSignal};
use dump_telemetry::Metrics;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Delivers rendered signals somewhere.
pub trait Notifier: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Deliver one signal. `text` is the rendered message.
    fn notify<'a>(&'a self, signal: &'a DumpSignal, text: &'a str) -> BoxFuture<'a, NotifyResult<()>>;
}

/// Writes every rendered message to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify<'a>(&'a self, signal: &'a DumpSignal, text: &'a str) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            info!(contract = %signal.contract, "Dump signal\n{text}");
            Ok(())
        })
    }
}

/// Drain `rx`, handing each signal to every notifier in turn.
///
/// With an `enricher`, CEX quotes are looked up before rendering.
/// Failures are logged and counted, never retried. Returns the number of
/// signals processed once every sender is gone.
pub async fn run_notifier(
    mut rx: mpsc::Receiver<DumpSignal>,
    notifiers: Vec<Arc<dyn Notifier>>,
    enricher: Option<CexEnricher>,
) -> u64 {
    let names: Vec<&str> = notifiers.iter().map(|n| n.name()).collect();
    info!(notifiers = ?names, cex_quotes = enricher.is_some(), "Notifier task started");

    let mut processed = 0u64;
    while let Some(signal) = rx.recv().await {
        processed += 1;
        debug!(summary = %summary_line(&signal), "Delivering signal");
        let quotes = match &enricher {
            Some(enricher) => enricher.quotes(&signal).await,
            None => Vec::new(),
        };
        let text = render_signal(&signal, &quotes, Utc::now());
        for notifier in &notifiers {
            match notifier.notify(&signal, &text).await {
                Ok(()) => Metrics::notification_sent(notifier.name()),
                Err(e) => {
                    warn!(
                        notifier = notifier.name(),
                        contract = %signal.contract,
                        error = %e,
                        "Notification failed"
                    );
                    Metrics::notification_failed(notifier.name());
                }
            }
        }
    }

    info!(processed, "Notifier task stopped");
    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::sink::signal_channel;
    use dump_core::{ContractId, Exchange, Network, Price, TokenView, TradePair};
    use dump_detector::{CexPriceMap, MockCexPriceSource, SignalSink};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct RecordingNotifier {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn notify<'a>(&'a self, _signal: &'a DumpSignal, text: &'a str) -> BoxFuture<'a, NotifyResult<()>> {
            Box::pin(async move {
                self.seen.lock().push(text.to_string());
                if self.fail {
                    Err(NotifyError::Telegram("chat not found".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn signal() -> DumpSignal {
        let contract = ContractId::new("0x00000000000000000000000000000000000000cc", Network::Optimism);
        DumpSignal {
            token: TokenView::new("op", "Optimism", vec![contract.clone()]),
            contract,
            baseline_price: Price::new(dec!(2)),
            current_price: Price::new(dec!(1)),
            price_delta: Price::new(dec!(-1)),
            change_percent: dec!(-50),
            window: Duration::from_secs(120),
            rule_index: 1,
            trigger_percentage: dec!(25),
            detected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_every_notifier_sees_every_signal() {
        let failing = Arc::new(RecordingNotifier {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let ok = Arc::new(RecordingNotifier {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let (sink, rx) = signal_channel(8);
        sink.publish(signal());
        sink.publish(signal());
        drop(sink);

        let notifiers: Vec<Arc<dyn Notifier>> = vec![failing.clone(), ok.clone(), Arc::new(LogNotifier)];
        let processed = run_notifier(rx, notifiers, None).await;

        assert_eq!(processed, 2);
        // a failing notifier does not stop delivery to the next one
        assert_eq!(failing.seen.lock().len(), 2);
        let texts = ok.seen.lock();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("*OP/-50.00%*"));
    }

    #[tokio::test]
    async fn test_enricher_adds_spread_section() {
        let ok = Arc::new(RecordingNotifier {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let cex = Arc::new(MockCexPriceSource::new());
        cex.set("op", CexPriceMap::from([(Exchange::Binance, Price::new(dec!(1.1)))]));

        let mut listed = signal();
        listed
            .token
            .trade_pairs
            .insert(Exchange::Binance, TradePair::new("OP", "USDT"));
        let mut unknown = listed.clone();
        unknown.token.symbol = "nope".to_string();

        let (sink, rx) = signal_channel(8);
        sink.publish(listed);
        sink.publish(unknown);
        sink.publish(signal());
        drop(sink);

        let enricher = CexEnricher::new(cex.clone(), Exchange::ALL.to_vec());
        let processed = run_notifier(rx, vec![ok.clone() as Arc<dyn Notifier>], Some(enricher)).await;

        assert_eq!(processed, 3);
        let texts = ok.seen.lock();
        assert!(texts[0].contains("__Spread on CEX__:\n  Binance: `1.1, 10.00%`\n"));
        // failed lookup still delivers, without the section
        assert!(!texts[1].contains("Spread on CEX"));
        assert!(!texts[2].contains("Spread on CEX"));
        assert_eq!(cex.queries(), vec!["op", "nope"]);
    }
}
