//! Log keyword alert relay library.

pub mod config;
pub mod delivery;
pub mod monitor;
pub mod observability;

pub use config::RuntimeConfig;
pub use delivery::{Notifier, TelegramClient};
pub use monitor::TailMonitor;
