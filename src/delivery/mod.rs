//! Outbound notification delivery.
//!
//! # Responsibilities
//! - Send one message per match to the configured chat
//! - Report failures to the caller as a typed error
//!
//! # Design Decisions
//! - Single best-effort attempt: no retry, no queue, no rate limit
//! - The monitor decides what to do with errors (it only logs them)
//! - `Notifier` is the seam between the tail loop and the HTTP client

pub mod telegram;

use std::future::Future;

use thiserror::Error;

pub use telegram::TelegramClient;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint could not be built from the base URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Connection, TLS or body read failure.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The API answered with an error.
    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        // The URL embeds the bot token.
        DeliveryError::Transport(e.without_url())
    }
}

/// Something that can forward a message body to its destination.
pub trait Notifier {
    /// Perform one delivery attempt.
    fn deliver(&self, text: &str) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
