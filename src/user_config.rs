use crate::error::{BotError, BotResult};
use crate::models::UserConfig;
use crate::store::Store;
use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info};

/// Get-or-create and save semantics over the `configs` collection
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn Store>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fetch the user's config, creating and persisting the defaults on first contact
    pub async fn get_or_create(&self, user_id: i64) -> BotResult<UserConfig> {
        let existing = self
            .store
            .get_config(user_id)
            .await
            .with_context(|| format!("Failed to load config for user {}", user_id))
            .map_err(BotError::Internal)?;

        if let Some(cfg) = existing {
            debug!(user_id, mode = %cfg.mode, "Loaded user config");
            return Ok(cfg);
        }

        let cfg = UserConfig::new(user_id);
        self.store
            .create_config(&cfg)
            .await
            .with_context(|| format!("Failed to create config for user {}", user_id))
            .map_err(BotError::Internal)?;

        info!(user_id, "Created default config for new user");
        Ok(cfg)
    }

    pub async fn save(&self, cfg: &UserConfig) -> BotResult<()> {
        self.store
            .save_config(cfg)
            .await
            .with_context(|| format!("Failed to save config for user {}", cfg.user_id))
            .map_err(BotError::Internal)
    }
}
