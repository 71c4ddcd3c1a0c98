//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! monitor / delivery
//!     → tracing macros (structured fields: path, keyword, status)
//!     → logging.rs subscriber (EnvFilter + fmt layer)
//!     → stderr
//! ```
//!
//! # Design Decisions
//! - Per-event and per-delivery detail is logged at debug level, so the
//!   `debug` setting alone decides whether it is visible
//! - Startup, reopen and watch failures are logged at info/warn

pub mod logging;
