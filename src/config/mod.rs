//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! argv
//!     → cli.rs (clap flags)
//!     → if no flags: loader.rs reads ~/.config/tg_log.ini
//!                    (writes a template and fails if it is missing)
//!     → Settings (unvalidated)
//!     → validation.rs (required fields, N > 0)
//!     → RuntimeConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is resolved exactly once at startup; there is no reload
//! - Flags and file are alternatives, never merged
//! - Validation reports every missing field, not just the first

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{default_config_path, resolve, resolve_from_args, ConfigError};
pub use schema::{RuntimeConfig, Settings};
