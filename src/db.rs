use crate::models::{Mode, TranscriptEntry, TranslationRecord, UserConfig};
use crate::retry::{with_retry, RetryConfig};
use crate::store::Store;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database and create tables
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = with_retry(&RetryConfig::health_check(), "Database connect", || async {
            PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
        })
        .await
        .context("Failed to connect to PostgreSQL")?;

        let db = Self { pool };
        db.create_tables().await?;
        info!("✓ Database ready");
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS configs (
                user_id BIGINT PRIMARY KEY,
                source_lang TEXT NOT NULL,
                target_lang TEXT NOT NULL,
                mode TEXT NOT NULL,
                pending_answer TEXT NOT NULL DEFAULT '',
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create configs table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translations (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                chat_id BIGINT NOT NULL,
                source_text TEXT NOT NULL,
                target_text TEXT NOT NULL,
                source_lang TEXT NOT NULL,
                target_lang TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create translations table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                chat_id BIGINT NOT NULL,
                text TEXT NOT NULL,
                is_bot BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create messages table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS translations_user_id_idx ON translations (user_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create translations index")?;

        Ok(())
    }
}

fn config_from_row(row: &PgRow) -> Result<UserConfig> {
    let mode: String = row.try_get("mode")?;
    Ok(UserConfig {
        user_id: row.try_get("user_id")?,
        source_lang: row.try_get("source_lang")?,
        target_lang: row.try_get("target_lang")?,
        mode: mode.parse::<Mode>()?,
        pending_answer: row.try_get("pending_answer")?,
    })
}

fn translation_from_row(row: &PgRow) -> Result<TranslationRecord> {
    Ok(TranslationRecord {
        user_id: row.try_get("user_id")?,
        chat_id: row.try_get("chat_id")?,
        source_text: row.try_get("source_text")?,
        target_text: row.try_get("target_text")?,
        source_lang: row.try_get("source_lang")?,
        target_lang: row.try_get("target_lang")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Store for Database {
    async fn get_config(&self, user_id: i64) -> Result<Option<UserConfig>> {
        let row = sqlx::query(
            "SELECT user_id, source_lang, target_lang, mode, pending_answer
             FROM configs WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user config")?;

        row.as_ref().map(config_from_row).transpose()
    }

    async fn create_config(&self, cfg: &UserConfig) -> Result<()> {
        sqlx::query(
            "INSERT INTO configs (user_id, source_lang, target_lang, mode, pending_answer)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(cfg.user_id)
        .bind(&cfg.source_lang)
        .bind(&cfg.target_lang)
        .bind(cfg.mode.as_str())
        .bind(&cfg.pending_answer)
        .execute(&self.pool)
        .await
        .context("Failed to create user config")?;

        Ok(())
    }

    async fn save_config(&self, cfg: &UserConfig) -> Result<()> {
        sqlx::query(
            "INSERT INTO configs (user_id, source_lang, target_lang, mode, pending_answer)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO UPDATE SET
                source_lang = EXCLUDED.source_lang,
                target_lang = EXCLUDED.target_lang,
                mode = EXCLUDED.mode,
                pending_answer = EXCLUDED.pending_answer,
                updated_at = NOW()",
        )
        .bind(cfg.user_id)
        .bind(&cfg.source_lang)
        .bind(&cfg.target_lang)
        .bind(cfg.mode.as_str())
        .bind(&cfg.pending_answer)
        .execute(&self.pool)
        .await
        .context("Failed to save user config")?;

        Ok(())
    }

    async fn create_translation(&self, record: &TranslationRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO translations
                (user_id, chat_id, source_text, target_text, source_lang, target_lang, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.user_id)
        .bind(record.chat_id)
        .bind(&record.source_text)
        .bind(&record.target_text)
        .bind(&record.source_lang)
        .bind(&record.target_lang)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to save translation")?;

        Ok(())
    }

    async fn translation_count(&self, user_id: Option<i64>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM translations WHERE ($1::BIGINT IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count translations")?;

        Ok(count.max(0) as u64)
    }

    async fn translation_at(
        &self,
        user_id: Option<i64>,
        index: u64,
    ) -> Result<Option<TranslationRecord>> {
        let offset = i64::try_from(index).context("Translation index out of range")?;
        let row = sqlx::query(
            "SELECT user_id, chat_id, source_text, target_text, source_lang, target_lang, created_at
             FROM translations
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY id
             OFFSET $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch translation")?;

        row.as_ref().map(translation_from_row).transpose()
    }

    async fn create_message(&self, entry: &TranscriptEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (user_id, chat_id, text, is_bot, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(entry.chat_id)
        .bind(&entry.text)
        .bind(entry.is_bot)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to save message")?;

        Ok(())
    }
}
