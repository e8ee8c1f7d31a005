//! Engine-side signal sink.

use dump_detector::{DumpSignal, SignalSink};
use dump_telemetry::Metrics;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Create a bounded signal channel.
pub fn signal_channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<DumpSignal>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSink { tx }, rx)
}

/// [`SignalSink`] that forwards into a bounded channel without waiting.
///
/// A full or closed channel drops the signal.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<DumpSignal>,
}

impl SignalSink for ChannelSink {
    fn publish(&self, signal: DumpSignal) {
        match self.tx.try_send(signal) {
            Ok(()) => {}
            Err(TrySendError::Full(signal)) => {
                warn!(contract = %signal.contract, "Notification queue full, dropping signal");
                Metrics::signal_dropped("channel_full");
            }
            Err(TrySendError::Closed(signal)) => {
                warn!(contract = %signal.contract, "Notifier stopped, dropping signal");
                Metrics::signal_dropped("channel_closed");
            }
        }
    }
}
