// src/services/notifier.rs

//! Outbound notification channel.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;

/// Text sent in place of an empty caption.
pub const NO_CAPTION: &str = "(No caption)";

/// Sends one (caption, url) message.
///
/// An `Err` means the message was not delivered; the caller must leave the
/// link eligible for a later attempt.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, caption: &str, url: &str) -> Result<()>;
}

/// Telegram Bot API notifier.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, caption: &str, url: &str) -> Result<()> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            return Err(AppError::notification(url, "bot token or chat id not configured"));
        }

        let text = format_message(caption, url);
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "false"),
        ];

        let response = self
            .client
            .post(self.endpoint())
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::notification(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notification(url, format!("HTTP {status}: {body}")));
        }

        log::info!("Sent to Telegram: {}", url);
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, caption: &str, url: &str) -> Result<()> {
        log::info!("[dry-run] {} | {}", url, display_caption(caption));
        Ok(())
    }
}

/// HTML message body: bold caption followed by the post link.
pub fn format_message(caption: &str, url: &str) -> String {
    format!(
        "<b>{}</b>\n\n<a href='{}'>🔗 View Post</a>",
        html_escape::encode_text(display_caption(caption)),
        html_escape::encode_single_quoted_attribute(url)
    )
}

fn display_caption(caption: &str) -> &str {
    let caption = caption.trim();
    if caption.is_empty() { NO_CAPTION } else { caption }
}
