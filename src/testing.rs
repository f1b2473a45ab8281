//! Test doubles for the store, translator and transport seams.

use crate::error::{BotError, BotResult};
use crate::models::{TranscriptEntry, TranslationRecord, UserConfig};
use crate::store::Store;
use crate::telegram::{Chat, Message, MessageEntity, Transport, User};
use crate::translator::Translator;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn text_message(user_id: i64, text: &str) -> Message {
    Message {
        message_id: 1,
        from: Some(User {
            id: user_id,
            username: None,
            first_name: "Test".to_string(),
        }),
        chat: Chat {
            id: user_id,
            r#type: "private".to_string(),
        },
        text: Some(text.to_string()),
        entities: None,
    }
}

pub fn command_message(user_id: i64, text: &str) -> Message {
    let length = text.split_whitespace().next().map_or(0, |w| w.len()) as i64;
    Message {
        entities: Some(vec![MessageEntity {
            r#type: "bot_command".to_string(),
            offset: 0,
            length,
        }]),
        ..text_message(user_id, text)
    }
}

/// Translator answering from a fixed table; unknown input echoes back uppercased
#[derive(Default)]
pub struct FakeTranslator {
    responses: Mutex<HashMap<String, String>>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, text: &str, translated: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(text.to_string(), translated.to_string());
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    /// `(text, source, target)` for every call, in order
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> BotResult<String> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(BotError::TranslationProvider(anyhow::anyhow!(reason)));
        }
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_uppercase()))
    }
}

/// Transport that records every delivered message
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(i64, String)>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("transport unavailable");
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Transport whose sends never complete
pub struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
    async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<()> {
        futures::future::pending::<()>().await;
        Ok(())
    }
}

/// Store where every operation fails
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn get_config(&self, _user_id: i64) -> Result<Option<UserConfig>> {
        anyhow::bail!("store offline")
    }

    async fn create_config(&self, _cfg: &UserConfig) -> Result<()> {
        anyhow::bail!("store offline")
    }

    async fn save_config(&self, _cfg: &UserConfig) -> Result<()> {
        anyhow::bail!("store offline")
    }

    async fn create_translation(&self, _record: &TranslationRecord) -> Result<()> {
        anyhow::bail!("store offline")
    }

    async fn translation_count(&self, _user_id: Option<i64>) -> Result<u64> {
        anyhow::bail!("store offline")
    }

    async fn translation_at(
        &self,
        _user_id: Option<i64>,
        _index: u64,
    ) -> Result<Option<TranslationRecord>> {
        anyhow::bail!("store offline")
    }

    async fn create_message(&self, _entry: &TranscriptEntry) -> Result<()> {
        anyhow::bail!("store offline")
    }
}

/// In-memory store that refuses new translation records
#[derive(Default)]
pub struct ReadOnlyTranslations {
    pub inner: crate::store::MemoryStore,
}

#[async_trait]
impl Store for ReadOnlyTranslations {
    async fn get_config(&self, user_id: i64) -> Result<Option<UserConfig>> {
        self.inner.get_config(user_id).await
    }

    async fn create_config(&self, cfg: &UserConfig) -> Result<()> {
        self.inner.create_config(cfg).await
    }

    async fn save_config(&self, cfg: &UserConfig) -> Result<()> {
        self.inner.save_config(cfg).await
    }

    async fn create_translation(&self, _record: &TranslationRecord) -> Result<()> {
        anyhow::bail!("translations table is read-only")
    }

    async fn translation_count(&self, user_id: Option<i64>) -> Result<u64> {
        self.inner.translation_count(user_id).await
    }

    async fn translation_at(
        &self,
        user_id: Option<i64>,
        index: u64,
    ) -> Result<Option<TranslationRecord>> {
        self.inner.translation_at(user_id, index).await
    }

    async fn create_message(&self, entry: &TranscriptEntry) -> Result<()> {
        self.inner.create_message(entry).await
    }
}

/// In-memory store that accepts only the first `allowed` config saves
pub struct LimitedConfigSaves {
    pub inner: crate::store::MemoryStore,
    remaining: AtomicUsize,
}

impl LimitedConfigSaves {
    pub fn new(allowed: usize) -> Self {
        Self {
            inner: crate::store::MemoryStore::new(),
            remaining: AtomicUsize::new(allowed),
        }
    }
}

#[async_trait]
impl Store for LimitedConfigSaves {
    async fn get_config(&self, user_id: i64) -> Result<Option<UserConfig>> {
        self.inner.get_config(user_id).await
    }

    async fn create_config(&self, cfg: &UserConfig) -> Result<()> {
        self.inner.create_config(cfg).await
    }

    async fn save_config(&self, cfg: &UserConfig) -> Result<()> {
        let granted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            anyhow::bail!("config writes exhausted");
        }
        self.inner.save_config(cfg).await
    }

    async fn create_translation(&self, record: &TranslationRecord) -> Result<()> {
        self.inner.create_translation(record).await
    }

    async fn translation_count(&self, user_id: Option<i64>) -> Result<u64> {
        self.inner.translation_count(user_id).await
    }

    async fn translation_at(
        &self,
        user_id: Option<i64>,
        index: u64,
    ) -> Result<Option<TranslationRecord>> {
        self.inner.translation_at(user_id, index).await
    }

    async fn create_message(&self, entry: &TranscriptEntry) -> Result<()> {
        self.inner.create_message(entry).await
    }
}
