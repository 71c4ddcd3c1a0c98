//! The tail-and-notify loop.

use std::fs;
use std::io::{self, BufRead};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;

use crate::config::RuntimeConfig;
use crate::delivery::Notifier;
use crate::monitor::matcher::KeywordMatcher;
use crate::monitor::target::{ReadOutcome, TargetEvent, WatchTarget};
use crate::monitor::watcher::TargetWatcher;
use crate::monitor::MonitorError;

/// Longest wait for the first change notification of a tick.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(1);

/// Pause between ticks.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Watches every configured file and relays matching lines.
pub struct TailMonitor<N> {
    targets: Vec<WatchTarget>,
    watcher: TargetWatcher,
    matcher: KeywordMatcher,
    excerpt_words: NonZeroUsize,
    notifier: N,
    wait: Duration,
    pause: Duration,
}

impl<N: Notifier> TailMonitor<N> {
    /// Open and watch every target.
    ///
    /// Fails if a target is missing or not a regular file. Once running, an
    /// unavailable file is only retried.
    pub fn new(config: &RuntimeConfig, notifier: N) -> Result<Self, MonitorError> {
        let mut watcher = TargetWatcher::new().map_err(MonitorError::WatcherInit)?;
        let mut targets: Vec<WatchTarget> = Vec::with_capacity(config.targets.len());

        for configured in &config.targets {
            check_regular_file(configured)?;
            check_text_file(configured)?;
            let path = absolute(configured)?;
            if targets.iter().any(|t| t.path() == path) {
                tracing::warn!(path = %path.display(), "Ignoring duplicate target");
                continue;
            }

            let mut target = WatchTarget::new(path);
            target.open().map_err(|source| MonitorError::Io {
                path: configured.clone(),
                source,
            })?;
            watcher
                .watch(target.path())
                .map_err(|source| MonitorError::Watch {
                    path: configured.clone(),
                    source,
                })?;
            target.set_watched(true);

            tracing::info!(
                path = %target.path().display(),
                offset = target.offset().unwrap_or_default(),
                "Watching file"
            );
            targets.push(target);
        }

        Ok(Self {
            targets,
            watcher,
            matcher: KeywordMatcher::new(config.keywords.clone()),
            excerpt_words: config.excerpt_words,
            notifier,
            wait: DEFAULT_WAIT,
            pause: DEFAULT_PAUSE,
        })
    }

    /// Override the notification wait and the pause between ticks.
    pub fn with_intervals(mut self, wait: Duration, pause: Duration) -> Self {
        self.wait = wait;
        self.pause = pause;
        self
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    /// Run until the notification channel breaks.
    pub async fn run(mut self) -> Result<std::convert::Infallible, MonitorError> {
        tracing::info!(
            targets = self.targets.len(),
            keywords = ?self.matcher.keywords(),
            "Monitoring started"
        );

        loop {
            self.tick().await?;
            sleep(self.pause).await;
        }
    }

    /// One iteration: wait for notifications, retry closed targets, handle
    /// every pending event. Returns how many notifications were dispatched.
    pub async fn tick(&mut self) -> Result<usize, MonitorError> {
        let batch = self.watcher.next_batch(self.wait).await?;

        for idx in 0..self.targets.len() {
            if !self.targets[idx].is_open() {
                self.restore(idx);
            }
        }

        let mut dispatched = 0;
        for (path, event) in batch {
            let Some(idx) = self.targets.iter().position(|t| t.path() == path) else {
                continue;
            };
            dispatched += self.handle(idx, event).await;
        }

        Ok(dispatched)
    }

    async fn handle(&mut self, idx: usize, event: TargetEvent) -> usize {
        match event {
            TargetEvent::Moved | TargetEvent::Deleted => {
                tracing::debug!(
                    path = %self.targets[idx].path().display(),
                    ?event,
                    "File moved or deleted"
                );
                self.rewatch(idx);
                0
            }
            TargetEvent::Attributes => {
                if self.targets[idx].is_replaced() {
                    tracing::debug!(
                        path = %self.targets[idx].path().display(),
                        "File replaced or unlinked"
                    );
                    self.rewatch(idx);
                }
                0
            }
            TargetEvent::Modified => {
                tracing::debug!(path = %self.targets[idx].path().display(), "File modified");

                match self.targets[idx].read_appended() {
                    Ok(ReadOutcome::Lines(lines)) => {
                        self.dispatch(self.targets[idx].path(), &lines).await
                    }
                    Ok(ReadOutcome::Truncated { size }) => {
                        tracing::debug!(
                            path = %self.targets[idx].path().display(),
                            size,
                            "File truncated"
                        );
                        0
                    }
                    Ok(ReadOutcome::Closed) => {
                        self.restore(idx);
                        0
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %self.targets[idx].path().display(),
                            error = %e,
                            "Failed to read file, reopening"
                        );
                        self.rewatch(idx);
                        0
                    }
                }
            }
        }
    }

    /// Match each line and send at most one notification for it.
    async fn dispatch(&self, path: &Path, lines: &[String]) -> usize {
        let mut dispatched = 0;

        for line in lines {
            let Some(hit) = self.matcher.check(path, line) else {
                continue;
            };
            let body = hit.excerpt(self.excerpt_words);
            tracing::debug!(
                path = %hit.path.display(),
                keyword = hit.keyword,
                line = %hit.line,
                "Detected keyword"
            );

            if let Err(e) = self.notifier.deliver(&body).await {
                tracing::debug!(error = %e, text = %body, "Delivery failed");
            }
            dispatched += 1;
        }

        dispatched
    }

    /// Drop the handle and the watch, then try to pick the path up again.
    fn rewatch(&mut self, idx: usize) {
        let target = &mut self.targets[idx];
        if target.is_watched() {
            // The kernel usually drops the watch itself on delete.
            let _ = self.watcher.unwatch(target.path());
            target.set_watched(false);
        }
        target.close();
        self.restore(idx);
    }

    /// Closed → Tracking. Leaves the target closed if the file is not there.
    fn restore(&mut self, idx: usize) {
        let target = &mut self.targets[idx];

        if let Err(e) = target.open() {
            tracing::debug!(
                path = %target.path().display(),
                error = %e,
                "File unavailable, retrying next tick"
            );
            return;
        }

        if !target.is_watched() {
            if let Err(e) = self.watcher.watch(target.path()) {
                tracing::warn!(path = %target.path().display(), error = %e, "Failed to re-add watch");
                target.close();
                return;
            }
            target.set_watched(true);
        }

        tracing::info!(
            path = %target.path().display(),
            offset = target.offset().unwrap_or_default(),
            "Reopened file"
        );
    }
}

fn check_regular_file(path: &Path) -> Result<(), MonitorError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(MonitorError::NotRegularFile(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(MonitorError::TargetMissing(path.to_path_buf()))
        }
        Err(source) => Err(MonitorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Rejects files containing a NUL byte anywhere in their current content.
fn check_text_file(path: &Path) -> Result<(), MonitorError> {
    let io_err = |source: io::Error| MonitorError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = io::BufReader::new(fs::File::open(path).map_err(io_err)?);

    loop {
        let chunk = reader.fill_buf().map_err(io_err)?;
        if chunk.is_empty() {
            return Ok(());
        }
        if chunk.contains(&0) {
            return Err(MonitorError::NotTextFile(path.to_path_buf()));
        }
        let len = chunk.len();
        reader.consume(len);
    }
}

/// Event paths from the watcher are absolute, so targets are too.
fn absolute(path: &Path) -> Result<PathBuf, MonitorError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Recorder {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for Recorder {
        async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(DeliveryError::Rejected {
                    status: 500,
                    description: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn config(targets: Vec<PathBuf>, keywords: &[&str], n: usize) -> RuntimeConfig {
        RuntimeConfig {
            targets,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            excerpt_words: NonZeroUsize::new(n).unwrap(),
            bot_id: "token".into(),
            chat_id: "chat".into(),
            debug: true,
        }
    }

    fn append(path: &Path, data: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(data.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    fn monitor(cfg: &RuntimeConfig, recorder: &Recorder) -> TailMonitor<Recorder> {
        TailMonitor::new(cfg, recorder.clone())
            .unwrap()
            .with_intervals(Duration::from_millis(100), Duration::ZERO)
    }

    async fn tick_until<N: Notifier>(monitor: &mut TailMonitor<N>, mut done: impl FnMut(&TailMonitor<N>) -> bool) {
        for _ in 0..50 {
            monitor.tick().await.unwrap();
            if done(monitor) {
                return;
            }
        }
        panic!("condition not reached");
    }

    #[test]
    fn test_missing_target_fails_startup() {
        let dir = TempDir::new().unwrap();
        let cfg = config(vec![dir.path().join("absent.log")], &["ERROR"], 3);

        let err = TailMonitor::new(&cfg, Recorder::default()).err().unwrap();
        assert!(matches!(err, MonitorError::TargetMissing(_)));
        assert!(err.to_string().ends_with("does not exist"));
    }

    #[test]
    fn test_directory_target_fails_startup() {
        let dir = TempDir::new().unwrap();
        let cfg = config(vec![dir.path().to_path_buf()], &["ERROR"], 3);

        let err = TailMonitor::new(&cfg, Recorder::default()).err().unwrap();
        assert!(matches!(err, MonitorError::NotRegularFile(_)));
    }

    #[test]
    fn test_binary_target_fails_startup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.bin");
        fs::write(&path, b"ERROR header\n\0\x01\x02").unwrap();
        let cfg = config(vec![path], &["ERROR"], 3);

        let err = TailMonitor::new(&cfg, Recorder::default()).err().unwrap();
        assert!(matches!(err, MonitorError::NotTextFile(_)));
        assert!(err.to_string().ends_with("is not a text file"));
    }

    #[test]
    fn test_duplicate_targets_are_collapsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();
        let cfg = config(vec![path.clone(), path], &["ERROR"], 3);

        let m = TailMonitor::new(&cfg, Recorder::default()).unwrap();
        assert_eq!(m.targets().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_content_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "ERROR written before startup\n").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR"], 3);
        let mut m = monitor(&cfg, &recorder);

        append(&path, "ERROR after startup\n");
        tick_until(&mut m, |_| !recorder.sent().is_empty()).await;

        assert_eq!(recorder.sent(), vec!["ERROR after startup"]);
    }

    #[tokio::test]
    async fn test_matching_lines_are_relayed_as_excerpts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR", "WARN"], 3);
        let mut m = monitor(&cfg, &recorder);

        append(
            &path,
            "ERROR disk full now please retry soon\n\
             INFO nothing to see\n\
             WARN and ERROR in one line\n",
        );
        tick_until(&mut m, |_| recorder.sent().len() >= 2).await;

        assert_eq!(recorder.sent(), vec!["ERROR disk full", "WARN and ERROR"]);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_the_loop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let cfg = config(vec![path.clone()], &["ERROR"], 2);
        let mut m = monitor(&cfg, &recorder);

        append(&path, "ERROR one\n");
        tick_until(&mut m, |_| recorder.sent().len() == 1).await;
        append(&path, "ERROR two\n");
        tick_until(&mut m, |_| recorder.sent().len() == 2).await;

        assert_eq!(recorder.sent(), vec!["ERROR one", "ERROR two"]);
    }

    #[tokio::test]
    async fn test_truncation_resets_to_end_of_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "a long line that will be truncated away\n").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR"], 5);
        let mut m = monitor(&cfg, &recorder);

        fs::write(&path, "short\n").unwrap();
        tick_until(&mut m, |m| m.targets()[0].offset() <= Some(6)).await;

        append(&path, "ERROR after truncate\n");
        tick_until(&mut m, |_| !recorder.sent().is_empty()).await;

        assert_eq!(recorder.sent(), vec!["ERROR after truncate"]);
    }

    #[tokio::test]
    async fn test_delete_and_recreate_resumes_monitoring() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "original content\n").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR"], 3);
        let mut m = monitor(&cfg, &recorder);

        fs::remove_file(&path).unwrap();
        fs::write(&path, "x\n").unwrap();
        tick_until(&mut m, |m| {
            let t = &m.targets()[0];
            t.is_open() && t.is_watched() && t.offset() == Some(2)
        })
        .await;

        append(&path, "ERROR after recreate\n");
        tick_until(&mut m, |_| !recorder.sent().is_empty()).await;

        assert_eq!(recorder.sent(), vec!["ERROR after recreate"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_retried_each_tick() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "seed\n").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR"], 3);
        let mut m = monitor(&cfg, &recorder);

        fs::remove_file(&path).unwrap();
        tick_until(&mut m, |m| !m.targets()[0].is_open()).await;

        // Still closed while the file is gone.
        m.tick().await.unwrap();
        assert!(!m.targets()[0].is_open());

        fs::write(&path, "").unwrap();
        tick_until(&mut m, |m| m.targets()[0].is_open()).await;

        append(&path, "ERROR back again\n");
        tick_until(&mut m, |_| !recorder.sent().is_empty()).await;
        assert_eq!(recorder.sent(), vec!["ERROR back again"]);
    }

    #[tokio::test]
    async fn test_moved_file_is_replaced_by_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let rotated = dir.path().join("app.log.1");
        fs::write(&path, "before rotation\n").unwrap();

        let recorder = Recorder::default();
        let cfg = config(vec![path.clone()], &["ERROR"], 3);
        let mut m = monitor(&cfg, &recorder);

        fs::rename(&path, &rotated).unwrap();
        fs::write(&path, "").unwrap();
        tick_until(&mut m, |m| {
            let t = &m.targets()[0];
            t.is_open() && t.is_watched() && t.offset() == Some(0)
        })
        .await;

        append(&rotated, "ERROR rotated handle still read\n");
        append(&path, "ERROR fresh file picked up\n");
        tick_until(&mut m, |_| !recorder.sent().is_empty()).await;

        // Lines written to the renamed file must never be relayed.
        for _ in 0..3 {
            m.tick().await.unwrap();
        }
        assert_eq!(recorder.sent(), vec!["ERROR fresh file"]);
    }
}
