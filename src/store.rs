//! Persistence capability used by the bot core.
//!
//! The core only sees [`Store`]; `db::Database` backs it with PostgreSQL and
//! [`MemoryStore`] keeps everything in process (local runs and tests).

use crate::models::{TranscriptEntry, TranslationRecord, UserConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the config for a user, `None` if the user was never seen
    async fn get_config(&self, user_id: i64) -> Result<Option<UserConfig>>;

    /// Insert a new config. An existing record for the same user is left untouched.
    async fn create_config(&self, cfg: &UserConfig) -> Result<()>;

    /// Full upsert keyed by `user_id`
    async fn save_config(&self, cfg: &UserConfig) -> Result<()>;

    async fn create_translation(&self, record: &TranslationRecord) -> Result<()>;

    /// Number of saved translations, optionally restricted to one user
    async fn translation_count(&self, user_id: Option<i64>) -> Result<u64>;

    /// The translation at `index` in insertion order, optionally restricted to one user
    async fn translation_at(&self, user_id: Option<i64>, index: u64)
        -> Result<Option<TranslationRecord>>;

    async fn create_message(&self, entry: &TranscriptEntry) -> Result<()>;
}

#[derive(Default)]
struct MemoryState {
    configs: Vec<UserConfig>,
    translations: Vec<TranslationRecord>,
    messages: Vec<TranscriptEntry>,
}

/// In-process store. Counts config writes so callers can assert on them.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    config_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    /// Number of create/save config calls that reached the store
    pub fn config_writes(&self) -> usize {
        self.config_writes.load(Ordering::SeqCst)
    }

    pub fn config_count(&self) -> usize {
        self.lock().map(|s| s.configs.len()).unwrap_or(0)
    }

    pub fn translations(&self) -> Vec<TranslationRecord> {
        self.lock().map(|s| s.translations.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<TranscriptEntry> {
        self.lock().map(|s| s.messages.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_config(&self, user_id: i64) -> Result<Option<UserConfig>> {
        let state = self.lock()?;
        Ok(state.configs.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn create_config(&self, cfg: &UserConfig) -> Result<()> {
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock()?;
        if !state.configs.iter().any(|c| c.user_id == cfg.user_id) {
            state.configs.push(cfg.clone());
        }
        Ok(())
    }

    async fn save_config(&self, cfg: &UserConfig) -> Result<()> {
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock()?;
        match state.configs.iter_mut().find(|c| c.user_id == cfg.user_id) {
            Some(existing) => *existing = cfg.clone(),
            None => state.configs.push(cfg.clone()),
        }
        Ok(())
    }

    async fn create_translation(&self, record: &TranslationRecord) -> Result<()> {
        self.lock()?.translations.push(record.clone());
        Ok(())
    }

    async fn translation_count(&self, user_id: Option<i64>) -> Result<u64> {
        let state = self.lock()?;
        let count = state
            .translations
            .iter()
            .filter(|t| user_id.map_or(true, |id| t.user_id == id))
            .count();
        Ok(count as u64)
    }

    async fn translation_at(
        &self,
        user_id: Option<i64>,
        index: u64,
    ) -> Result<Option<TranslationRecord>> {
        let state = self.lock()?;
        let record = state
            .translations
            .iter()
            .filter(|t| user_id.map_or(true, |id| t.user_id == id))
            .nth(index as usize)
            .cloned();
        Ok(record)
    }

    async fn create_message(&self, entry: &TranscriptEntry) -> Result<()> {
        self.lock()?.messages.push(entry.clone());
        Ok(())
    }
}
