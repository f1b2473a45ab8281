use crate::error::BotResult;
use crate::models::{Mode, DEFAULT_MODE};
use crate::quiz::QuizEngine;
use crate::replies;
use crate::user_config::ConfigStore;
use tracing::info;

/// Bot commands, matched case-sensitively on the name after `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Toggle between Learn and Translate
    Mode,
    /// Exchange source and target languages
    Swap,
    /// Enter the quiz drill
    Repeat,
    /// Leave the quiz drill
    Stop,
    Unknown(String),
}

impl Command {
    pub fn from_name(name: &str) -> Self {
        match name {
            "start" => Command::Start,
            "mode" => Command::Mode,
            "swap" => Command::Swap,
            "repeat" => Command::Repeat,
            "stop" => Command::Stop,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Applies commands to a user's persisted mode and language pair
#[derive(Clone)]
pub struct ModeMachine {
    configs: ConfigStore,
    quiz: QuizEngine,
}

impl ModeMachine {
    pub fn new(configs: ConfigStore, quiz: QuizEngine) -> Self {
        Self { configs, quiz }
    }

    /// Run a command for `user_id` and return the reply text.
    /// State changes are persisted before this returns.
    pub async fn handle(&self, user_id: i64, command: &Command) -> BotResult<String> {
        if let Command::Unknown(name) = command {
            info!(user_id, command = %name, "Unknown command");
            return Ok(replies::INVALID_COMMAND.to_string());
        }

        let mut cfg = self.configs.get_or_create(user_id).await?;

        let reply = match command {
            Command::Start => replies::start(&cfg.source_lang, &cfg.target_lang),
            Command::Mode => {
                cfg.mode = cfg.mode.toggled();
                // Neither Learn nor Translate has an armed answer
                cfg.pending_answer.clear();
                self.configs.save(&cfg).await?;
                info!(user_id, mode = %cfg.mode, "Mode changed");
                replies::mode_saved(cfg.mode)
            }
            Command::Swap => {
                cfg.swap_languages();
                self.configs.save(&cfg).await?;
                info!(user_id, source = %cfg.source_lang, target = %cfg.target_lang, "Languages swapped");
                replies::languages_saved(&cfg.source_lang, &cfg.target_lang)
            }
            Command::Repeat => {
                // Mode and armed answer are written together by `arm`
                cfg.mode = Mode::Repeat;
                let prompt = self.quiz.arm(&mut cfg).await?;
                info!(user_id, "Repeat session started");
                prompt
            }
            Command::Stop => {
                cfg.mode = DEFAULT_MODE;
                cfg.pending_answer.clear();
                self.configs.save(&cfg).await?;
                info!(user_id, "Repeat session stopped");
                replies::repeat_stopped(DEFAULT_MODE)
            }
            Command::Unknown(_) => replies::INVALID_COMMAND.to_string(),
        };

        Ok(reply)
    }
}
