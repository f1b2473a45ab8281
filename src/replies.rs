//! Fixed bot reply texts. These are kept verbatim, typos included,
//! because existing users and tests match on them.

use crate::models::Mode;

pub const INVALID_COMMAND: &str = "Invalid command.";
pub const QUIZ_CORRECT: &str = "Excellent!";
pub const QUIZ_INCORRECT: &str = "Incorrect.";

pub fn start(source_lang: &str, target_lang: &str) -> String {
    format!(
        "Let's begin. Type any word or phrase you want to translate. Default translate setting: {} -> {}",
        source_lang, target_lang
    )
}

pub fn mode_saved(mode: Mode) -> String {
    format!("Mode saved to - {}.", mode)
}

pub fn languages_saved(source_lang: &str, target_lang: &str) -> String {
    format!(
        "Languages saved. Current settings: {} -> {}.",
        source_lang, target_lang
    )
}

pub fn repeat_stopped(mode: Mode) -> String {
    format!("Repeat sessiong is off. Current mode - {}.", mode)
}
