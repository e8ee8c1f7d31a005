//! Notification configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// Environment variable holding the bot token.
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Configuration for signal delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Signals buffered between engine and notifier task.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Also write rendered messages to the log.
    #[serde(default = "default_log_enabled")]
    pub log: bool,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

fn default_channel_capacity() -> usize {
    256
}

fn default_log_enabled() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            log: default_log_enabled(),
            telegram: None,
        }
    }
}

impl NotifyConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be positive".to_string());
        }
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }
        Ok(())
    }
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Falls back to `TELEGRAM_BOT_TOKEN` when unset.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Target chat id (negative for groups and channels).
    pub chat_id: i64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl TelegramConfig {
    pub fn new(chat_id: i64) -> Self {
        Self {
            bot_token: None,
            chat_id,
            api_base: default_api_base(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chat_id == 0 {
            return Err("telegram.chat_id must be set".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("telegram.request_timeout_ms must be positive".to_string());
        }
        Ok(())
    }

    /// Configured token, or `TELEGRAM_BOT_TOKEN` from the environment.
    pub fn resolved_token(&self) -> Option<String> {
        self.bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TELEGRAM_BOT_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
