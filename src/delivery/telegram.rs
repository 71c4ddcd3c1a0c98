//! Telegram Bot API client.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::delivery::{DeliveryError, Notifier};

/// Public Bot API host.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Form body of `sendMessage`.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// The parts of the API envelope we look at.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Client bound to one bot token and one chat.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: Url,
    chat_id: String,
}

impl TelegramClient {
    /// Client for the public Bot API.
    pub fn new(bot_id: &str, chat_id: &str) -> Result<Self, DeliveryError> {
        Self::with_base_url(DEFAULT_API_BASE, bot_id, chat_id)
    }

    /// Client for an API served at `base` (used against local mock servers).
    pub fn with_base_url(base: &str, bot_id: &str, chat_id: &str) -> Result<Self, DeliveryError> {
        let mut endpoint = Url::parse(base)
            .map_err(|e| DeliveryError::InvalidUrl(format!("'{}': {}", base, e)))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| DeliveryError::InvalidUrl(format!("'{}' cannot be a base", base)))?
            .pop_if_empty()
            .push(&format!("bot{}", bot_id))
            .push("sendMessage");

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            chat_id: chat_id.to_string(),
        })
    }

    /// POST one message. The response body only matters for error reporting.
    pub async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        let accepted = status.is_success() && parsed.as_ref().map_or(true, |r| r.ok);
        if !accepted {
            let description = parsed.and_then(|r| r.description).unwrap_or(body);
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description,
            });
        }

        tracing::debug!(
            chat_id = %self.chat_id,
            text,
            response = %body,
            "Sent message to Telegram"
        );
        Ok(())
    }
}

impl Notifier for TelegramClient {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        self.send_message(text).await
    }
}
