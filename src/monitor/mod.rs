//! Tail-and-notify subsystem.
//!
//! # Data Flow
//! ```text
//! inotify (notify crate)
//!     → watcher.rs (classify: Modified / Moved / Deleted, batch per tick)
//!     → tail.rs (route event to its WatchTarget)
//!     → target.rs (truncation check, read complete appended lines)
//!     → matcher.rs (first keyword in order, first N words)
//!     → delivery (one best-effort send per matching line)
//! ```
//!
//! # Design Decisions
//! - One loop owns every target; no locks, no spawned tasks
//! - Moved/deleted files are closed and reopened at end-of-data
//! - A file that cannot be reopened is retried every tick, never fatal

pub mod matcher;
pub mod tail;
pub mod target;
pub mod watcher;

use std::path::PathBuf;

use thiserror::Error;

pub use matcher::{KeywordMatcher, MatchEvent};
pub use tail::TailMonitor;
pub use target::{ReadOutcome, TargetEvent, WatchTarget};

/// Errors that stop the monitor from starting or running.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{} does not exist", .0.display())]
    TargetMissing(PathBuf),

    #[error("{} is not a regular file", .0.display())]
    NotRegularFile(PathBuf),

    #[error("{} is not a text file", .0.display())]
    NotTextFile(PathBuf),

    #[error("unable to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to add watch for {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    #[error("file watcher channel closed")]
    ChannelClosed,
}
