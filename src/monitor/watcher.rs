//! Filesystem change notifications for watched targets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::monitor::target::TargetEvent;
use crate::monitor::MonitorError;

/// OS watcher whose callback forwards raw events into a channel drained by
/// the tail loop.
pub struct TargetWatcher {
    watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl TargetWatcher {
    pub fn new() -> Result<Self, notify::Error> {
        let (tx, events) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self { watcher, events })
    }

    /// Register a single file (non-recursive).
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)
    }

    pub fn unwatch(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.watcher.unwatch(path)
    }

    /// Wait up to `timeout` for the first event, then drain whatever else is
    /// already pending. An empty batch means the wait timed out.
    pub async fn next_batch(
        &mut self,
        timeout: Duration,
    ) -> Result<Vec<(PathBuf, TargetEvent)>, MonitorError> {
        let mut batch = Vec::new();

        let first = match tokio::time::timeout(timeout, self.events.recv()).await {
            Err(_elapsed) => return Ok(batch),
            Ok(None) => return Err(MonitorError::ChannelClosed),
            Ok(Some(res)) => res,
        };
        collect(first, &mut batch);

        while let Ok(res) = self.events.try_recv() {
            collect(res, &mut batch);
        }

        Ok(batch)
    }
}

fn collect(res: notify::Result<Event>, batch: &mut Vec<(PathBuf, TargetEvent)>) {
    match res {
        Ok(event) => {
            if let Some(kind) = classify(&event.kind) {
                batch.extend(event.paths.into_iter().map(|path| (path, kind)));
            }
        }
        Err(e) => tracing::warn!(error = %e, "File watcher error"),
    }
}

/// Map a notify event kind onto what the tail loop reacts to.
pub fn classify(kind: &EventKind) -> Option<TargetEvent> {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) => Some(TargetEvent::Moved),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(TargetEvent::Attributes),
        EventKind::Modify(_) => Some(TargetEvent::Modified),
        EventKind::Remove(_) => Some(TargetEvent::Deleted),
        EventKind::Create(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}
