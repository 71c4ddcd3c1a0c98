//! Configuration schema definitions.
//!
//! `Settings` is what the command line or the config file said, before any
//! checks. `RuntimeConfig` is the validated, immutable form the monitor runs
//! with.

use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Unvalidated settings gathered from one source (flags or file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Log files to watch.
    pub filenames: Vec<PathBuf>,

    /// Keywords, in the order they are tested.
    pub keywords: Vec<String>,

    /// Number of words to include in the message. Zero means unset.
    pub n: usize,

    /// Telegram bot token.
    pub bot_id: String,

    /// Destination chat id.
    pub chat_id: String,

    /// Verbose logging of events and deliveries.
    pub debug: bool,
}

/// Validated configuration. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Log files to watch.
    pub targets: Vec<PathBuf>,

    /// Keywords, in the order they are tested.
    pub keywords: Vec<String>,

    /// Number of whitespace-delimited words forwarded per match.
    pub excerpt_words: NonZeroUsize,

    /// Telegram bot token.
    pub bot_id: String,

    /// Destination chat id.
    pub chat_id: String,

    /// Verbose logging of events and deliveries.
    pub debug: bool,
}

/// Split a comma separated value, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
