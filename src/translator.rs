use crate::error::{BotError, BotResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TRANSLATE_PATH: &str = "/language/translate/v2";

/// Text translation capability
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    /// Never retries; any failure is a `TranslationProvider` error.
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
        -> BotResult<String>;
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Google Translate v2 client
#[derive(Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("Google Translate API key cannot be empty");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Google Translate")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, TRANSLATE_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("model", "base"),
                ("target", target_lang),
                ("source", source_lang),
                ("format", "text"),
                ("q", text),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to Google Translate API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Translate API error ({}): {}", status, body);
        }

        let payload: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse Google Translate response")?;

        let translated = payload
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .context("Google Translate response contained no translations")?;

        if translated.trim().is_empty() {
            anyhow::bail!("Google Translate returned an empty translation");
        }

        Ok(translated)
    }
}

impl std::fmt::Debug for GoogleTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslator")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> BotResult<String> {
        debug!(source_lang, target_lang, "Requesting translation");
        self.request(text, source_lang, target_lang)
            .await
            .map_err(BotError::TranslationProvider)
    }
}
