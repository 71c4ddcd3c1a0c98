//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, after configuration is resolved
//! - Map the `debug` flag onto the default filter
//!
//! # Design Decisions
//! - `RUST_LOG` always overrides the flag-derived default
//! - Logs go to stderr; stdout stays unused

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given debug setting.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "log_alert_relay=debug"
    } else {
        "log_alert_relay=info"
    }
}

/// Install the global subscriber.
pub fn init(debug: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(debug).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
