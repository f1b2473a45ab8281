use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// Telegram update types
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub entities: Option<Vec<MessageEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[allow(dead_code)]
    pub r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    pub r#type: String,
    pub offset: i64,
    pub length: i64,
}

impl Message {
    /// Command name if the message is a bot command: `/start@my_bot now` → `start`.
    ///
    /// A message is a command when its first entity is a `bot_command` at
    /// offset 0. Messages without entity data fall back to a leading `/`.
    pub fn command(&self) -> Option<&str> {
        let text = self.text.as_deref()?;

        let is_command = match &self.entities {
            Some(entities) => entities
                .first()
                .is_some_and(|e| e.r#type == "bot_command" && e.offset == 0),
            None => text.starts_with('/'),
        };
        if !is_command {
            return None;
        }

        let word = text
            .strip_prefix('/')?
            .split_whitespace()
            .next()
            .unwrap_or("");
        Some(word.split('@').next().unwrap_or(word))
    }
}

/// Outbound side of the chat platform
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    /// `request_timeout` must exceed the long-poll timeout used with [`Self::get_updates`]
    pub fn new(token: &str, api_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client for Telegram")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Telegram API", method))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error ({}): {}", status, body);
        }

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {} response", method))?;

        if !parsed.ok {
            anyhow::bail!(
                "Telegram API rejected {}: {}",
                method,
                parsed.description.unwrap_or_default()
            );
        }

        parsed
            .result
            .with_context(|| format!("Telegram {} response had no result", method))
    }

    /// Long-poll for updates newer than `offset`
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        debug!(count = updates.len(), offset, "Fetched updates");
        Ok(updates)
    }

    /// Point Telegram at our webhook endpoint
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let mut body = serde_json::json!({ "url": url, "allowed_updates": ["message"] });
        if let Some(secret) = secret {
            body["secret_token"] = serde_json::Value::String(secret.to_string());
        }
        let _: bool = self.call("setWebhook", &body).await?;
        Ok(())
    }

    /// Remove any webhook so `getUpdates` can be used
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", &serde_json::json!({})).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}
