use crate::error::{BotError, BotResult};
use crate::models::{PoolScope, UserConfig};
use crate::store::Store;
use crate::user_config::ConfigStore;
use anyhow::Context;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of checking a reply against the armed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Incorrect,
}

/// Drives the repeat drill. The armed answer lives in `UserConfig::pending_answer`.
#[derive(Clone)]
pub struct QuizEngine {
    store: Arc<dyn Store>,
    configs: ConfigStore,
    scope: PoolScope,
}

impl QuizEngine {
    pub fn new(store: Arc<dyn Store>, configs: ConfigStore, scope: PoolScope) -> Self {
        Self {
            store,
            configs,
            scope,
        }
    }

    /// Pick a random saved translation, arm its target text as the expected
    /// answer and return its source text as the prompt.
    pub async fn arm(&self, cfg: &mut UserConfig) -> BotResult<String> {
        let owner = match self.scope {
            PoolScope::Global => None,
            PoolScope::User => Some(cfg.user_id),
        };

        let count = self
            .store
            .translation_count(owner)
            .await
            .context("Failed to count quiz material")
            .map_err(BotError::Internal)?;
        if count == 0 {
            return Err(BotError::NoQuizMaterial);
        }

        let index = rand::thread_rng().gen_range(0..count);
        let record = self
            .store
            .translation_at(owner, index)
            .await
            .context("Failed to load quiz material")
            .map_err(BotError::Internal)?
            .ok_or(BotError::NoQuizMaterial)?;

        cfg.pending_answer = record.target_text;
        self.configs.save(cfg).await?;

        debug!(user_id = cfg.user_id, pool_size = count, index, "Armed quiz round");
        Ok(record.source_text)
    }

    /// Compare `reply` verbatim with the armed answer. Touches no state;
    /// the caller arms the next round after acknowledging a correct reply.
    pub fn check(&self, cfg: &UserConfig, reply: &str) -> QuizOutcome {
        if !cfg.pending_answer.is_empty() && reply == cfg.pending_answer {
            info!(user_id = cfg.user_id, "Quiz answer correct");
            QuizOutcome::Correct
        } else {
            debug!(user_id = cfg.user_id, "Quiz answer incorrect");
            QuizOutcome::Incorrect
        }
    }
}
