use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::backend::ClipboardBackend;
use crate::models::ClipMeta;
use crate::storage::StateStorage;

/// Watcher lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Not polling (before start / after shutdown)
    Idle,
    /// Actively polling the clipboard on the configured interval
    Polling,
}

/// Outcome of a single poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// New text was captured and persisted
    Captured,
    /// Clipboard content matches the last forwarded text (or is empty)
    Unchanged,
    /// The clipboard could not be read or the capture could not be
    /// persisted; treated like "no change" and retried on the next tick
    Unavailable,
}

/// Polls the system clipboard and forwards new text into the clip store.
///
/// Remembers the last text it forwarded (`last_seen`, in-memory only) so an
/// unchanged clipboard never re-triggers a capture. Each capture goes through
/// a full load-mutate-save cycle against the latest persisted state, so the
/// watcher can run alongside a foreground session without holding a lock.
/// Nothing a backend or storage failure does can crash the poll loop.
pub struct ClipboardWatcher {
    backend: Box<dyn ClipboardBackend>,
    storage: Box<dyn StateStorage>,
    interval: Duration,
    last_seen: Option<String>,
    state: WatcherState,
}

impl ClipboardWatcher {
    /// Create a watcher polling at `interval`
    pub fn new(
        backend: Box<dyn ClipboardBackend>,
        storage: Box<dyn StateStorage>,
        interval: Duration,
    ) -> Self {
        ClipboardWatcher {
            backend,
            storage,
            interval,
            last_seen: None,
            state: WatcherState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one poll: read the clipboard, classify, and forward a change.
    pub fn tick(&mut self) -> Poll {
        let text = match self.backend.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return Poll::Unchanged,
            Err(e) => {
                // Restricted contexts deny clipboard reads; not an error
                log::debug!("Clipboard read unavailable: {:#}", e);
                return Poll::Unavailable;
            }
        };

        if text.trim().is_empty() {
            return Poll::Unchanged;
        }

        if self.last_seen.as_deref() == Some(text.as_str()) {
            return Poll::Unchanged;
        }

        match self.forward(&text) {
            Ok(()) => {
                self.last_seen = Some(text);
                Poll::Captured
            }
            Err(e) => {
                // Transient storage failure; last_seen stays unset so the
                // same text is retried on the next tick
                log::warn!("Failed to persist captured clip: {:#}", e);
                Poll::Unavailable
            }
        }
    }

    /// Poll on the configured interval until `shutdown` is set.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        self.state = WatcherState::Polling;
        log::info!(
            "Clipboard watcher polling every {}ms via {}",
            self.interval.as_millis(),
            self.backend.name()
        );

        while !shutdown.load(Ordering::Relaxed) {
            if self.tick() == Poll::Captured {
                log::debug!("Captured new clipboard text");
            }
            std::thread::sleep(self.interval);
        }

        self.state = WatcherState::Idle;
        log::info!("Clipboard watcher stopped");
    }

    fn forward(&self, text: &str) -> anyhow::Result<()> {
        let mut store = self.storage.load()?;
        if store.add_clip(text, ClipMeta::default()).is_some() {
            self.storage.save(&store)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use crate::storage::BincodeStateStorage;
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Backend that replays a scripted sequence of reads
    struct ScriptedBackend {
        reads: Mutex<VecDeque<anyhow::Result<Option<String>>>>,
    }

    impl ScriptedBackend {
        fn new(reads: Vec<anyhow::Result<Option<String>>>) -> Self {
            ScriptedBackend {
                reads: Mutex::new(reads.into()),
            }
        }
    }

    impl ClipboardBackend for ScriptedBackend {
        fn read_text(&self) -> anyhow::Result<Option<String>> {
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }

        fn write_text(&self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Scripted"
        }
    }

    fn watcher_with(
        dir: &TempDir,
        reads: Vec<anyhow::Result<Option<String>>>,
    ) -> ClipboardWatcher {
        let backend = Box::new(ScriptedBackend::new(reads));
        let storage = Box::new(BincodeStateStorage::new(
            dir.path().join("state.bin"),
            Settings::default(),
        ));
        ClipboardWatcher::new(backend, storage, Duration::from_millis(1))
    }

    fn load_store(dir: &TempDir) -> crate::models::ClipStore {
        BincodeStateStorage::new(dir.path().join("state.bin"), Settings::default())
            .load()
            .unwrap()
    }

    #[test]
    fn test_new_text_is_captured() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(&dir, vec![Ok(Some("hello".to_string()))]);

        assert_eq!(watcher.tick(), Poll::Captured);

        let store = load_store(&dir);
        assert_eq!(store.recent()[0].text, "hello");
    }

    #[test]
    fn test_unchanged_text_is_not_recaptured() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(
            &dir,
            vec![
                Ok(Some("same".to_string())),
                Ok(Some("same".to_string())),
                Ok(Some("same".to_string())),
            ],
        );

        assert_eq!(watcher.tick(), Poll::Captured);
        assert_eq!(watcher.tick(), Poll::Unchanged);
        assert_eq!(watcher.tick(), Poll::Unchanged);

        assert_eq!(load_store(&dir).recent().len(), 1);
    }

    #[test]
    fn test_change_then_change_back_recaptures() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(
            &dir,
            vec![
                Ok(Some("a".to_string())),
                Ok(Some("b".to_string())),
                Ok(Some("a".to_string())),
            ],
        );

        assert_eq!(watcher.tick(), Poll::Captured);
        assert_eq!(watcher.tick(), Poll::Captured);
        // "a" differs from last_seen ("b"), so it is forwarded again;
        // the store dedups it back to a single entry at the head
        assert_eq!(watcher.tick(), Poll::Captured);

        let store = load_store(&dir);
        assert_eq!(store.recent().len(), 2);
        assert_eq!(store.recent()[0].text, "a");
    }

    #[test]
    fn test_read_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(
            &dir,
            vec![
                Err(anyhow!("permission denied")),
                Ok(Some("after failure".to_string())),
            ],
        );

        assert_eq!(watcher.tick(), Poll::Unavailable);
        assert_eq!(watcher.tick(), Poll::Captured);
    }

    #[test]
    fn test_empty_and_blank_reads_are_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(&dir, vec![Ok(None), Ok(Some("   ".to_string()))]);

        assert_eq!(watcher.tick(), Poll::Unchanged);
        assert_eq!(watcher.tick(), Poll::Unchanged);
        assert!(load_store(&dir).recent().is_empty());
    }

    #[test]
    fn test_run_stops_on_shutdown_signal() {
        let dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(&dir, vec![Ok(Some("once".to_string()))]);
        let shutdown = AtomicBool::new(false);

        assert_eq!(watcher.state(), WatcherState::Idle);

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                watcher.run(&shutdown);
            });
            std::thread::sleep(Duration::from_millis(20));
            shutdown.store(true, Ordering::Relaxed);
            handle.join().unwrap();
        });

        assert_eq!(watcher.state(), WatcherState::Idle);
        assert_eq!(load_store(&dir).recent().len(), 1);
    }

    #[test]
    fn test_capture_sees_latest_persisted_state() {
        let dir = TempDir::new().unwrap();
        let storage = BincodeStateStorage::new(dir.path().join("state.bin"), Settings::default());

        // A foreground writer persists a clip between ticks
        let mut store = storage.load().unwrap();
        store.add_clip("from session", crate::models::ClipMeta::default());
        storage.save(&store).unwrap();

        let mut watcher = watcher_with(&dir, vec![Ok(Some("from watcher".to_string()))]);
        assert_eq!(watcher.tick(), Poll::Captured);

        let merged = load_store(&dir);
        assert_eq!(merged.recent().len(), 2);
        assert_eq!(merged.recent()[0].text, "from watcher");
        assert_eq!(merged.recent()[1].text, "from session");
    }
}
