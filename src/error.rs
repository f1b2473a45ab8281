use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Sorry, something went wrong.";

/// Failures that can end the handling of a single update
#[derive(Debug, Error)]
pub enum BotError {
    /// Config or store failure not tied to a specific external API
    #[error("internal error: {0:#}")]
    Internal(#[source] anyhow::Error),

    #[error("translation provider error: {0:#}")]
    TranslationProvider(#[source] anyhow::Error),

    /// Writing a new translation record failed
    #[error("failed to persist translation: {0:#}")]
    TranslationPersist(#[source] anyhow::Error),

    #[error("failed to send message: {0:#}")]
    Send(#[source] anyhow::Error),

    #[error("no saved translations to quiz on")]
    NoQuizMaterial,
}

/// Tag identifying a [`BotError`] variant without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Internal,
    TranslationProvider,
    TranslationPersist,
    Send,
    NoQuizMaterial,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::TranslationProvider => "translation_provider",
            ErrorKind::TranslationPersist => "translation_persist",
            ErrorKind::Send => "send",
            ErrorKind::NoQuizMaterial => "no_quiz_material",
        }
    }
}

/// User-facing text per error kind. Kinds missing here get [`GENERIC_FAILURE`].
const USER_MESSAGES: &[(ErrorKind, &str)] = &[
    (ErrorKind::Internal, "Internal error occured, try later."),
    (ErrorKind::TranslationProvider, "Outer API error, try later."),
    (ErrorKind::TranslationPersist, "Internal gateway error."),
    (ErrorKind::Send, "Error occured while sending your results."),
];

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Internal(_) => ErrorKind::Internal,
            BotError::TranslationProvider(_) => ErrorKind::TranslationProvider,
            BotError::TranslationPersist(_) => ErrorKind::TranslationPersist,
            BotError::Send(_) => ErrorKind::Send,
            BotError::NoQuizMaterial => ErrorKind::NoQuizMaterial,
        }
    }

    /// Message shown to the user when handling their update failed
    pub fn user_message(&self) -> &'static str {
        user_message_for(self.kind())
    }
}

pub fn user_message_for(kind: ErrorKind) -> &'static str {
    USER_MESSAGES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, msg)| *msg)
        .unwrap_or(GENERIC_FAILURE)
}

pub type BotResult<T> = Result<T, BotError>;
