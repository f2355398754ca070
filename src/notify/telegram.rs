use super::NotificationSink;
use crate::config::TelegramConfig;
use crate::error::ChannelError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Telegram Bot API `sendMessage` sink.
pub struct TelegramSink {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ReplyParameters>,
}

#[derive(Debug, Deserialize)]
struct ReplyParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        debug!(channel = "telegram", chars = text.chars().count(), "Sending message");

        // reqwest::Error carries the URL; strip it so the bot token never reaches the logs.
        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reply: Option<ApiReply> = serde_json::from_str(&body).ok();

        if status.is_success() && reply.as_ref().map_or(true, |r| r.ok) {
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = reply
                .as_ref()
                .and_then(|r| r.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .unwrap_or(0);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        let description = reply
            .and_then(|r| r.description)
            .unwrap_or(body);
        Err(ChannelError::Api {
            status,
            description,
        })
    }
}
