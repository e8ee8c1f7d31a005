//! Telegram Bot API notifier.

use crate::config::TelegramConfig;
use crate::error::{NotifyError, NotifyResult};
use crate::notifier::Notifier;
use dump_detector::{BoxFuture, DumpSignal};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts rendered signals to one Telegram chat.
pub struct TelegramNotifier {
    client: Client,
    send_url: String,
    chat_id: i64,
}

impl std::fmt::Debug for TelegramNotifier {
    // keep the token out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> NotifyResult<Self> {
        let token = config.resolved_token().ok_or_else(|| {
            NotifyError::Config("telegram bot token missing (set bot_token or TELEGRAM_BOT_TOKEN)".to_string())
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| NotifyError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                token
            ),
            chat_id: config.chat_id,
        })
    }

    /// Send `text` as a Markdown message.
    pub async fn send_text(&self, text: &str) -> NotifyResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let body = SendMessage {
            chat_id: self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::HttpClient(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let api: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::HttpClient(format!("HTTP {status}: unreadable response: {}", e.without_url())))?;

        if !status.is_success() || !api.ok {
            return Err(NotifyError::Telegram(
                api.description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }

        debug!(chat_id = self.chat_id, "Telegram message sent");
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn notify<'a>(&'a self, _signal: &'a DumpSignal, text: &'a str) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(self.send_text(text))
    }
}
