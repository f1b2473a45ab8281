use crate::models::PoolScope;
use anyhow::{Context, Result};
use std::str::FromStr;

/// How updates reach the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Polling,
    Webhook,
}

impl FromStr for TransportMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" => Ok(TransportMode::Polling),
            "webhook" => Ok(TransportMode::Webhook),
            other => anyhow::bail!("unknown transport '{}', expected polling or webhook", other),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,

    // Google Translate
    pub google_translate_api_key: String,
    pub google_translate_api_url: String,
    pub translate_timeout_secs: u64,

    // Storage (in-memory when unset)
    pub database_url: Option<String>,

    // Transport
    pub transport: TransportMode,
    pub port: u16,
    pub telegram_webhook_secret: Option<String>,
    pub webhook_url: Option<String>,
    pub poll_timeout_secs: u64,

    // Dispatch
    pub dispatch_workers: usize,
    pub quiz_pool_scope: PoolScope,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"[REDACTED]")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("google_translate_api_key", &"[REDACTED]")
            .field("google_translate_api_url", &self.google_translate_api_url)
            .field("translate_timeout_secs", &self.translate_timeout_secs)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("transport", &self.transport)
            .field("port", &self.port)
            .field(
                "telegram_webhook_secret",
                &self.telegram_webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("webhook_url", &self.webhook_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("dispatch_workers", &self.dispatch_workers)
            .field("quiz_pool_scope", &self.quiz_pool_scope)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Telegram
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN not set")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),

            // Google Translate
            google_translate_api_key: std::env::var("GOOGLE_TRANSLATE_API_KEY")
                .context("GOOGLE_TRANSLATE_API_KEY not set")?,
            google_translate_api_url: std::env::var("GOOGLE_TRANSLATE_API_URL")
                .unwrap_or_else(|_| "https://translation.googleapis.com".to_string()),
            translate_timeout_secs: std::env::var("TRANSLATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            // Storage
            database_url: non_empty_var("DATABASE_URL"),

            // Transport
            transport: match non_empty_var("TRANSPORT") {
                Some(v) => v.parse().context("Invalid TRANSPORT")?,
                None => TransportMode::Polling,
            },
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            telegram_webhook_secret: non_empty_var("TELEGRAM_WEBHOOK_SECRET"),
            webhook_url: non_empty_var("WEBHOOK_URL"),
            poll_timeout_secs: std::env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            // Dispatch
            dispatch_workers: std::env::var("DISPATCH_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4_usize)
                .max(1),
            quiz_pool_scope: match non_empty_var("QUIZ_POOL_SCOPE") {
                Some(v) => v.parse().context("Invalid QUIZ_POOL_SCOPE")?,
                None => PoolScope::Global,
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
