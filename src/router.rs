use crate::error::{BotError, BotResult};
use crate::models::{Mode, TranslationRecord};
use crate::modes::{Command, ModeMachine};
use crate::quiz::{QuizEngine, QuizOutcome};
use crate::replies;
use crate::store::Store;
use crate::telegram::{Message, Transport};
use crate::translator::Translator;
use crate::user_config::ConfigStore;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// One handled inbound message and everything sent back for it
#[derive(Debug)]
pub struct Exchange {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: String,
    /// Replies that were delivered, in send order
    pub replies: Vec<String>,
    pub result: BotResult<()>,
}

/// Classifies messages as commands or plain text and runs the matching behavior
#[derive(Clone)]
pub struct Router {
    store: Arc<dyn Store>,
    translator: Arc<dyn Translator>,
    transport: Arc<dyn Transport>,
    configs: ConfigStore,
    quiz: QuizEngine,
    modes: ModeMachine,
}

impl Router {
    pub fn new(
        store: Arc<dyn Store>,
        translator: Arc<dyn Translator>,
        transport: Arc<dyn Transport>,
        quiz: QuizEngine,
    ) -> Self {
        let configs = ConfigStore::new(store.clone());
        let modes = ModeMachine::new(configs.clone(), quiz.clone());
        Self {
            store,
            translator,
            transport,
            configs,
            quiz,
            modes,
        }
    }

    /// Handle one message. Returns `None` when the message carries no text
    /// or no sender and is discarded.
    pub async fn route(&self, message: &Message) -> Option<Exchange> {
        let text = message.text.as_deref()?;
        let user_id = message.from.as_ref()?.id;
        let chat_id = message.chat.id;

        let mut replies = Vec::new();
        let result = match message.command() {
            Some(name) => {
                let command = Command::from_name(name);
                debug!(user_id, ?command, "Handling command");
                self.handle_command(user_id, chat_id, &command, &mut replies)
                    .await
            }
            None => {
                self.handle_message(user_id, chat_id, text, &mut replies)
                    .await
            }
        };

        Some(Exchange {
            user_id,
            chat_id,
            text: text.to_string(),
            replies,
            result,
        })
    }

    async fn handle_command(
        &self,
        user_id: i64,
        chat_id: i64,
        command: &Command,
        replies: &mut Vec<String>,
    ) -> BotResult<()> {
        let reply = self.modes.handle(user_id, command).await?;
        self.send(chat_id, reply, replies).await
    }

    async fn handle_message(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
        replies: &mut Vec<String>,
    ) -> BotResult<()> {
        let mut cfg = self.configs.get_or_create(user_id).await?;

        if cfg.mode == Mode::Repeat {
            return match self.quiz.check(&cfg, text) {
                QuizOutcome::Correct => {
                    self.send(chat_id, replies::QUIZ_CORRECT.to_string(), replies)
                        .await?;
                    let next_prompt = self.quiz.arm(&mut cfg).await?;
                    self.send(chat_id, next_prompt, replies).await
                }
                QuizOutcome::Incorrect => {
                    self.send(chat_id, replies::QUIZ_INCORRECT.to_string(), replies)
                        .await
                }
            };
        }

        let translated = self
            .translator
            .translate(text, &cfg.source_lang, &cfg.target_lang)
            .await?;
        if translated.trim().is_empty() {
            return Err(BotError::TranslationProvider(anyhow::anyhow!(
                "translation of {:?} ({} -> {}) came back empty",
                text,
                cfg.source_lang,
                cfg.target_lang
            )));
        }

        if cfg.mode == Mode::Learn {
            let record = TranslationRecord {
                user_id,
                chat_id,
                source_text: text.to_string(),
                target_text: translated.clone(),
                source_lang: cfg.source_lang.clone(),
                target_lang: cfg.target_lang.clone(),
                created_at: Utc::now(),
            };
            self.store
                .create_translation(&record)
                .await
                .context("Failed to save translation record")
                .map_err(BotError::TranslationPersist)?;
            info!(user_id, "Saved translation for learning");
        }

        self.send(chat_id, translated, replies).await
    }

    async fn send(&self, chat_id: i64, text: String, replies: &mut Vec<String>) -> BotResult<()> {
        self.transport
            .send_message(chat_id, &text)
            .await
            .map_err(BotError::Send)?;
        replies.push(text);
        Ok(())
    }
}
