//! Configuration validation.
//!
//! Turns `Settings` into a `RuntimeConfig`, reporting every problem at once
//! rather than stopping at the first.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::config::schema::{RuntimeConfig, Settings};

/// A single semantic problem with the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty or zero.
    #[error("missing required field `{0}`")]
    Missing(&'static str),
}

/// Validate settings from either source.
pub fn validate(settings: Settings) -> Result<RuntimeConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.filenames.is_empty() {
        errors.push(ValidationError::Missing("filename"));
    }
    if settings.keywords.is_empty() {
        errors.push(ValidationError::Missing("keyword"));
    }
    let excerpt_words = NonZeroUsize::new(settings.n);
    if excerpt_words.is_none() {
        errors.push(ValidationError::Missing("n"));
    }
    if settings.bot_id.trim().is_empty() {
        errors.push(ValidationError::Missing("bot_id"));
    }
    if settings.chat_id.trim().is_empty() {
        errors.push(ValidationError::Missing("chat_id"));
    }

    match excerpt_words {
        Some(excerpt_words) if errors.is_empty() => Ok(RuntimeConfig {
            targets: settings.filenames,
            keywords: settings.keywords,
            excerpt_words,
            bot_id: settings.bot_id.trim().to_string(),
            chat_id: settings.chat_id.trim().to_string(),
            debug: settings.debug,
        }),
        _ => Err(errors),
    }
}
