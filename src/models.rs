use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const DEFAULT_TARGET_LANG: &str = "ru";
pub const DEFAULT_MODE: Mode = Mode::Learn;

/// Governs how a user's plain-text messages are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Translate and save the pair for later quizzing
    Learn,
    /// Translate only
    Translate,
    /// Quiz the user on saved translations
    Repeat,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Learn => "Learn",
            Mode::Translate => "Translate",
            Mode::Repeat => "Repeat",
        }
    }

    /// Binary toggle between the two translation modes.
    /// `Repeat` is not an endpoint of the toggle and counts as `Learn`.
    pub fn toggled(self) -> Self {
        match self {
            Mode::Translate => Mode::Learn,
            Mode::Learn | Mode::Repeat => Mode::Translate,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Learn" => Ok(Mode::Learn),
            "Translate" => Ok(Mode::Translate),
            "Repeat" => Ok(Mode::Repeat),
            other => anyhow::bail!("Unknown mode: '{}'", other),
        }
    }
}

/// Per-user session settings, one record per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: i64,
    pub source_lang: String,
    pub target_lang: String,
    pub mode: Mode,
    /// Expected answer for the armed quiz round, empty when none is armed
    pub pending_answer: String,
}

impl UserConfig {
    /// Fresh config for a user seen for the first time
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            mode: DEFAULT_MODE,
            pending_answer: String::new(),
        }
    }

    pub fn swap_languages(&mut self) {
        std::mem::swap(&mut self.source_lang, &mut self.target_lang);
    }
}

/// A saved translation, the material quizzes draw from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub user_id: i64,
    pub chat_id: i64,
    pub source_text: String,
    pub target_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub created_at: DateTime<Utc>,
}

/// One line of the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn from_user(user_id: i64, chat_id: i64, text: &str) -> Self {
        Self {
            user_id,
            chat_id,
            text: text.to_string(),
            is_bot: false,
            created_at: Utc::now(),
        }
    }

    pub fn from_bot(user_id: i64, chat_id: i64, text: &str) -> Self {
        Self {
            is_bot: true,
            ..Self::from_user(user_id, chat_id, text)
        }
    }
}

/// Which saved translations a quiz may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolScope {
    /// Every user's saved translations
    Global,
    /// Only the requesting user's translations
    User,
}

impl FromStr for PoolScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(PoolScope::Global),
            "user" => Ok(PoolScope::User),
            other => anyhow::bail!("Invalid quiz pool scope: '{}'. Expected 'global' or 'user'", other),
        }
    }
}
