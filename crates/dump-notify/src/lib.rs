//! Signal delivery for the dump screener.
//!
//! The engine publishes into a [`ChannelSink`] without blocking; a
//! separate task ([`run_notifier`]) drains the channel, renders each
//! signal once and hands it to every configured [`Notifier`]. An optional
//! [`CexEnricher`] adds centralized exchange spreads to each message.

pub mod config;
pub mod error;
pub mod format;
pub mod notifier;
pub mod sink;
pub mod spread;
pub mod telegram;

pub use config::{NotifyConfig, TelegramConfig};
pub use error::{NotifyError, NotifyResult};
pub use format::{format_money, render_signal};
pub use notifier::{run_notifier, LogNotifier, Notifier};
pub use sink::{signal_channel, ChannelSink};
pub use spread::{CexEnricher, CexQuote};
pub use telegram::TelegramNotifier;
