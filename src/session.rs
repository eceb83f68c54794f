use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clipboard::ClipboardBackend;
use crate::models::{Clip, ClipMeta, ClipStore, FavoriteOutcome, Settings, Snapshot};
use crate::search::{SemanticSearchClient, substring_filter};
use crate::storage::{self, StateStorage};

/// Which list a session is presenting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Recent,
    Favorites,
}

/// A foreground view over the clip store.
///
/// Renders from a snapshot and routes every mutation through the store's
/// operations with a load-latest-then-save cycle, so a session never holds
/// stale lists across a background capture. Tab switching and searching are
/// pure reads.
pub struct Session {
    storage: Box<dyn StateStorage>,
    backend: Box<dyn ClipboardBackend>,
    snapshot: Snapshot,
    tab: Tab,
}

impl Session {
    /// Open a session: load the latest state and present the recent tab
    pub fn open(storage: Box<dyn StateStorage>, backend: Box<dyn ClipboardBackend>) -> Result<Self> {
        let snapshot = storage.load()?.snapshot();
        Ok(Session {
            storage,
            backend,
            snapshot,
            tab: Tab::Recent,
        })
    }

    /// Re-read the persisted state into a fresh snapshot
    pub fn refresh(&mut self) -> Result<()> {
        self.snapshot = self.storage.load()?.snapshot();
        Ok(())
    }

    /// Currently active tab
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switch the active tab. A pure read; the snapshot is untouched.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// The active tab's list, in presentation order
    pub fn visible(&self) -> &[Clip] {
        match self.tab {
            Tab::Recent => &self.snapshot.recent,
            Tab::Favorites => &self.snapshot.favorites,
        }
    }

    /// Current snapshot (both lists plus settings)
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Star state for rendering; visible from either tab
    pub fn is_favorite(&self, text: &str) -> bool {
        self.snapshot.favorites.iter().any(|f| f.text == text)
    }

    /// Capture text handed to us directly, the event-driven counterpart to
    /// the polling watcher. Provenance travels with the clip when the caller
    /// knows it. Blank text is a silent no-op per the store contract; returns
    /// the stored clip otherwise.
    pub fn capture(&mut self, text: &str, meta: ClipMeta) -> Result<Option<Clip>> {
        self.with_store(|store| store.add_clip(text, meta).cloned())
    }

    /// Activate the clip at `index` of the visible list: copy its text to the
    /// clipboard and, when on the recent tab, move it to the head to reflect
    /// renewed recency. Returns the activated clip, or `None` for a bad index.
    pub fn activate(&mut self, index: usize) -> Result<Option<Clip>> {
        let Some(clip) = self.visible().get(index).cloned() else {
            return Ok(None);
        };

        self.backend.write_text(&clip.text)?;

        if self.tab == Tab::Recent {
            self.with_store(|store| {
                store.move_to_top(&clip.text);
            })?;
        }

        Ok(Some(clip))
    }

    /// Toggle the favorite star of the clip at `index` of the visible list.
    /// `LimitReached` is returned unchanged as the upgrade-prompt signal.
    pub fn toggle_favorite(&mut self, index: usize) -> Result<Option<FavoriteOutcome>> {
        let Some(clip) = self.visible().get(index).cloned() else {
            return Ok(None);
        };

        let outcome = self.with_store(|store| store.toggle_favorite(&clip))?;
        Ok(Some(outcome))
    }

    /// Apply new list caps; returns the clamped settings actually stored
    pub fn apply_settings(&mut self, max_clips: usize, max_favorites: usize) -> Result<Settings> {
        self.with_store(|store| {
            store.apply_settings(max_clips, max_favorites);
            store.settings().clone()
        })
    }

    /// Change the account tier
    pub fn set_pro(&mut self, is_pro: bool) -> Result<Settings> {
        self.with_store(|store| {
            store.set_pro(is_pro);
            store.settings().clone()
        })
    }

    /// Filter the visible list by case-insensitive substring match
    pub fn filter(&self, query: &str) -> Vec<&Clip> {
        substring_filter(self.visible(), query)
    }

    /// Search the visible list.
    ///
    /// With a pro account and a configured client, ranking is delegated to
    /// the remote service and its result order is rendered as-is. Any remote
    /// failure logs a warning and falls back to the local substring filter;
    /// search never fails the render pass.
    pub fn search(&self, query: &str, client: Option<&SemanticSearchClient>) -> Vec<Clip> {
        if self.snapshot.settings.is_pro {
            if let Some(client) = client {
                let candidates: Vec<String> =
                    self.visible().iter().map(|c| c.text.clone()).collect();

                match client.search(query, &candidates) {
                    Ok(ranked) => {
                        return ranked
                            .iter()
                            .filter_map(|text| {
                                self.visible().iter().find(|c| &c.text == text).cloned()
                            })
                            .collect();
                    }
                    Err(e) => {
                        log::warn!("Semantic search failed, falling back to substring: {e}");
                    }
                }
            }
        }

        self.filter(query).into_iter().cloned().collect()
    }

    /// Export the favorites list to a JSON file
    pub fn export_favorites(&self, path: &Path) -> Result<()> {
        storage::export_favorites(&self.snapshot.favorites, path)
    }

    /// Import favorites from a JSON file, replacing the list wholesale.
    /// A structurally invalid file fails before any mutation.
    pub fn import_favorites(&mut self, path: &Path) -> Result<usize> {
        let clips = storage::import_favorites(path)?;

        self.with_store(|store| {
            store.replace_favorites(clips);
            store.favorites().len()
        })
    }

    /// Pinned mode: keep the view alive and re-read the persisted state on an
    /// interval so background captures show up live. Pure read; a failed
    /// refresh is logged and retried on the next tick. Returns when
    /// `shutdown` is set.
    pub fn follow(
        &mut self,
        interval: Duration,
        shutdown: &AtomicBool,
        mut on_update: impl FnMut(&Snapshot),
    ) {
        while !shutdown.load(Ordering::Relaxed) {
            match self.refresh() {
                Ok(()) => on_update(&self.snapshot),
                Err(e) => log::warn!("Failed to refresh pinned view: {:#}", e),
            }
            std::thread::sleep(interval);
        }
    }

    /// Load the latest persisted state, mutate it, save, and refresh the
    /// snapshot. Reading immediately before writing is what bounds races
    /// against the background watcher (last write wins).
    fn with_store<R>(&mut self, mutate: impl FnOnce(&mut ClipStore) -> R) -> Result<R> {
        let mut store = self.storage.load()?;
        let result = mutate(&mut store);
        self.storage.save(&store)?;
        self.snapshot = store.snapshot();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BincodeStateStorage;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Backend that records writes instead of touching a real clipboard
    #[derive(Default)]
    struct RecordingBackend {
        writes: Mutex<Vec<String>>,
    }

    impl ClipboardBackend for RecordingBackend {
        fn read_text(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn write_text(&self, text: &str) -> Result<()> {
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Recording"
        }
    }

    fn storage_in(dir: &TempDir) -> BincodeStateStorage {
        BincodeStateStorage::new(dir.path().join("state.bin"), Settings::default())
    }

    fn seeded_session(dir: &TempDir, texts: &[&str]) -> Session {
        let storage = storage_in(dir);
        let mut store = storage.load().unwrap();
        for text in texts {
            store.add_clip(text, ClipMeta::default());
        }
        storage.save(&store).unwrap();

        Session::open(Box::new(storage), Box::new(RecordingBackend::default())).unwrap()
    }

    fn visible_texts(session: &Session) -> Vec<&str> {
        session.visible().iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_open_defaults_to_recent_tab() {
        let dir = TempDir::new().unwrap();
        let session = seeded_session(&dir, &["a", "b"]);

        assert_eq!(session.tab(), Tab::Recent);
        assert_eq!(visible_texts(&session), vec!["b", "a"]);
    }

    #[test]
    fn test_tab_switch_is_pure_read() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);
        let before = session.snapshot().recent.clone();

        session.switch_tab(Tab::Favorites);
        assert!(session.visible().is_empty());

        session.switch_tab(Tab::Recent);
        assert_eq!(session.snapshot().recent, before);
    }

    #[test]
    fn test_capture_records_provenance_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);

        let meta = ClipMeta {
            source_url: Some("https://example.com/post".to_string()),
            source_title: Some("Example post".to_string()),
            app_name: None,
        };
        let clip = session
            .capture("from a copy event", meta.clone())
            .unwrap()
            .unwrap();

        assert_eq!(clip.meta, meta);
        assert_eq!(visible_texts(&session), vec!["from a copy event", "a"]);

        let reloaded = storage_in(&dir).load().unwrap();
        assert_eq!(reloaded.recent()[0].meta, meta);
    }

    #[test]
    fn test_capture_blank_text_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);

        assert!(session.capture("  \n", ClipMeta::default()).unwrap().is_none());
        assert_eq!(visible_texts(&session), vec!["a"]);
    }

    #[test]
    fn test_capture_dedups_against_existing_clips() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a", "b"]);
        // visible: b, a

        session.capture("a", ClipMeta::default()).unwrap().unwrap();

        // Same text entered through a second path: one entry, at the head
        assert_eq!(visible_texts(&session), vec!["a", "b"]);
    }

    #[test]
    fn test_activate_copies_and_moves_to_top() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a", "b", "c"]);
        // visible: c, b, a

        let activated = session.activate(2).unwrap().unwrap();
        assert_eq!(activated.text, "a");
        assert_eq!(visible_texts(&session), vec!["a", "c", "b"]);

        // The store was persisted, not just the snapshot
        let reloaded = storage_in(&dir).load().unwrap();
        assert_eq!(reloaded.recent()[0].text, "a");
    }

    #[test]
    fn test_activate_from_favorites_does_not_reorder_recent() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a", "b"]);
        session.toggle_favorite(1).unwrap(); // favorite "a"
        let recent_before = session.snapshot().recent.clone();

        session.switch_tab(Tab::Favorites);
        let activated = session.activate(0).unwrap().unwrap();

        assert_eq!(activated.text, "a");
        assert_eq!(session.snapshot().recent, recent_before);
    }

    #[test]
    fn test_activate_bad_index_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);

        assert!(session.activate(5).unwrap().is_none());
    }

    #[test]
    fn test_toggle_favorite_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);

        assert_eq!(
            session.toggle_favorite(0).unwrap(),
            Some(FavoriteOutcome::Added)
        );
        assert!(session.is_favorite("a"));

        assert_eq!(
            session.toggle_favorite(0).unwrap(),
            Some(FavoriteOutcome::Removed)
        );
        assert!(!session.is_favorite("a"));
    }

    #[test]
    fn test_limit_reached_surfaces_to_caller() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["x", "y"]);
        session.apply_settings(50, 1).unwrap();

        session.toggle_favorite(0).unwrap();
        assert_eq!(
            session.toggle_favorite(1).unwrap(),
            Some(FavoriteOutcome::LimitReached)
        );
    }

    #[test]
    fn test_refresh_picks_up_background_captures() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);

        // Simulate the watcher persisting a capture behind the session's back
        let storage = storage_in(&dir);
        let mut store = storage.load().unwrap();
        store.add_clip("background", ClipMeta::default());
        storage.save(&store).unwrap();

        assert_eq!(visible_texts(&session), vec!["a"]);
        session.refresh().unwrap();
        assert_eq!(visible_texts(&session), vec!["background", "a"]);
    }

    #[test]
    fn test_search_without_client_uses_substring() {
        let dir = TempDir::new().unwrap();
        let session = seeded_session(&dir, &["apple pie", "banana", "Apple sauce"]);

        let results = session.search("apple", None);
        let texts: Vec<&str> = results.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Apple sauce", "apple pie"]);
    }

    #[test]
    fn test_search_free_tier_ignores_semantic_client() {
        let dir = TempDir::new().unwrap();
        let session = seeded_session(&dir, &["local only"]);
        // Unreachable endpoint: would fail if contacted, but the free tier
        // never delegates
        let client = SemanticSearchClient::new(
            "https://invalid.example".to_string(),
            "key".to_string(),
            Duration::from_secs(1),
        );

        let results = session.search("local", Some(&client));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_import_replaces_and_export_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a", "b"]);
        session.toggle_favorite(0).unwrap();

        let path = dir.path().join("favorites.json");
        session.export_favorites(&path).unwrap();

        session.toggle_favorite(1).unwrap();
        assert_eq!(session.snapshot().favorites.len(), 2);

        let imported = session.import_favorites(&path).unwrap();
        assert_eq!(imported, 1);
        assert_eq!(session.snapshot().favorites[0].text, "b");
    }

    #[test]
    fn test_import_invalid_file_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);
        session.toggle_favorite(0).unwrap();

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{]").unwrap();

        assert!(session.import_favorites(&path).is_err());
        assert!(session.is_favorite("a"));
    }

    #[test]
    fn test_follow_reflects_background_writes() {
        let dir = TempDir::new().unwrap();
        let mut session = seeded_session(&dir, &["a"]);
        let shutdown = AtomicBool::new(false);
        let seen = Mutex::new(Vec::new());

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                session.follow(Duration::from_millis(5), &shutdown, |snapshot| {
                    seen.lock().unwrap().push(snapshot.recent.len());
                });
            });

            std::thread::sleep(Duration::from_millis(15));
            let storage = storage_in(&dir);
            let mut store = storage.load().unwrap();
            store.add_clip("late arrival", ClipMeta::default());
            storage.save(&store).unwrap();
            std::thread::sleep(Duration::from_millis(30));

            shutdown.store(true, Ordering::Relaxed);
            handle.join().unwrap();
        });

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&1));
        assert!(seen.contains(&2));
    }
}
