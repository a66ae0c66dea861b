use std::path::Path;

use colored::Colorize;
use quizsheet_core::answer_key::{parse_answer_key, AnswerKey};

use crate::prelude::{println, *};

/// Read the answer key at `path`.
///
/// Never fails: a missing file prints a warning and an unreadable or
/// malformed one prints the error, and both yield an empty key.
pub fn load_answer_key(path: &Path) -> AnswerKey {
    if !path.exists() {
        println!(
            "{} '{}' not found. The correct_answer column will be empty.",
            "[WARN]".yellow().bold(),
            path.display()
        );
        return AnswerKey::new();
    }

    let loaded = std::fs::read_to_string(path)
        .map_err(|e| eyre!(e))
        .and_then(|text| parse_answer_key(&text).map_err(|e| eyre!(e)));

    match loaded {
        Ok(key) => {
            log::debug!("loaded {} answer key entries from {}", key.len(), path.display());
            key
        }
        Err(err) => {
            println!(
                "{} Failed to load answer key '{}': {err}",
                "[ERROR]".red().bold(),
                path.display()
            );
            AnswerKey::new()
        }
    }
}
