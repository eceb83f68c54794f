use serde::{Deserialize, Serialize};

use super::clip::{Clip, ClipMeta, FavoriteOutcome};

/// Default recent-list cap for free accounts
pub const FREE_MAX_CLIPS: usize = 50;
/// Default favorites cap for free accounts
pub const FREE_MAX_FAVORITES: usize = 10;
/// Cap ceiling for pro accounts (both lists)
pub const PRO_LIMIT: usize = 1000;
/// Smallest configurable cap for either list
pub const MIN_CAP: usize = 1;

/// Scalar configuration persisted alongside the clip lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Maximum number of recent clips to keep
    pub max_clips: usize,
    /// Maximum number of favorite clips to keep
    pub max_favorites: usize,
    /// Pro accounts get the higher cap ceiling and semantic search
    pub is_pro: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_clips: FREE_MAX_CLIPS,
            max_favorites: FREE_MAX_FAVORITES,
            is_pro: false,
        }
    }
}

impl Settings {
    /// Cap ceiling for the recent list at the current tier
    pub fn clips_ceiling(&self) -> usize {
        if self.is_pro { PRO_LIMIT } else { FREE_MAX_CLIPS }
    }

    /// Cap ceiling for the favorites list at the current tier
    pub fn favorites_ceiling(&self) -> usize {
        if self.is_pro { PRO_LIMIT } else { FREE_MAX_FAVORITES }
    }

    /// Clamp a requested recent-list cap to the valid range for this tier
    pub fn clamp_clips(&self, requested: usize) -> usize {
        requested.clamp(MIN_CAP, self.clips_ceiling())
    }

    /// Clamp a requested favorites cap to the valid range for this tier
    pub fn clamp_favorites(&self, requested: usize) -> usize {
        requested.clamp(MIN_CAP, self.favorites_ceiling())
    }
}

/// Read-only consistent view of the store, taken for rendering
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub recent: Vec<Clip>,
    pub favorites: Vec<Clip>,
    pub settings: Settings,
}

/// The authoritative record of clips and settings.
///
/// Owns both ordered lists and every mutation rule: deduplication by exact
/// text, head insertion for recency, tail truncation for eviction. Callers
/// never reorder the lists directly. The two lists are independent; a favorite
/// is a copy of the clip, not a link, so eviction from one list never touches
/// the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipStore {
    /// Recent clips, most recent first; no duplicate texts
    recent: Vec<Clip>,
    /// Favorite clips, most recently favorited first; no duplicate texts
    favorites: Vec<Clip>,
    /// Scalar settings
    settings: Settings,
    /// Next ID to assign (monotonic counter)
    next_id: u64,
}

impl Default for ClipStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl ClipStore {
    /// Create an empty store with the given settings
    pub fn new(settings: Settings) -> Self {
        ClipStore {
            recent: Vec::new(),
            favorites: Vec::new(),
            settings,
            next_id: 1,
        }
    }

    /// Add a captured text to the head of the recent list.
    ///
    /// Empty or whitespace-only text is a silent no-op and returns `None`.
    /// An existing entry with the same text is removed first, so a re-copy
    /// never leaves a stale duplicate lower in the list. The list is then
    /// truncated from the tail to `max_clips`.
    pub fn add_clip(&mut self, text: &str, meta: ClipMeta) -> Option<&Clip> {
        if text.trim().is_empty() {
            log::debug!("Ignoring empty capture");
            return None;
        }

        self.recent.retain(|c| c.text != text);

        let id = self.next_id;
        self.next_id += 1;
        self.recent.insert(0, Clip::new(id, text.to_string(), meta));
        self.recent.truncate(self.settings.max_clips);

        self.recent.first()
    }

    /// Toggle a clip's membership in the favorites list.
    ///
    /// Removal is by exact text. Insertion copies the clip with a fresh
    /// timestamp and a new ID, at the head. A full favorites list on a free
    /// account rejects the insertion with `LimitReached` and no mutation.
    pub fn toggle_favorite(&mut self, clip: &Clip) -> FavoriteOutcome {
        if self.favorites.iter().any(|f| f.text == clip.text) {
            self.favorites.retain(|f| f.text != clip.text);
            return FavoriteOutcome::Removed;
        }

        if self.favorites.len() >= self.settings.max_favorites && !self.settings.is_pro {
            log::debug!("Favorites limit reached ({})", self.settings.max_favorites);
            return FavoriteOutcome::LimitReached;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.favorites
            .insert(0, Clip::new(id, clip.text.clone(), clip.meta.clone()));
        self.favorites.truncate(self.settings.max_favorites);

        FavoriteOutcome::Added
    }

    /// Move an existing recent entry to the head, keeping its identity and
    /// timestamp. Used when a clip is reused. No-op when the text is absent
    /// or already first; returns whether the list changed.
    pub fn move_to_top(&mut self, text: &str) -> bool {
        match self.recent.iter().position(|c| c.text == text) {
            Some(0) | None => false,
            Some(pos) => {
                let clip = self.recent.remove(pos);
                self.recent.insert(0, clip);
                true
            }
        }
    }

    /// Apply new list caps, clamped to the current tier's range, and truncate
    /// both lists immediately. Shrinking a cap drops the excess now rather
    /// than waiting for the next mutation.
    pub fn apply_settings(&mut self, max_clips: usize, max_favorites: usize) {
        self.settings.max_clips = self.settings.clamp_clips(max_clips);
        self.settings.max_favorites = self.settings.clamp_favorites(max_favorites);
        self.truncate_to_caps();

        log::debug!(
            "Applied settings: max_clips={}, max_favorites={}",
            self.settings.max_clips,
            self.settings.max_favorites
        );
    }

    /// Change the account tier. Downgrading re-clamps the stored caps to the
    /// free ceilings and truncates both lists.
    pub fn set_pro(&mut self, is_pro: bool) {
        self.settings.is_pro = is_pro;
        self.settings.max_clips = self.settings.clamp_clips(self.settings.max_clips);
        self.settings.max_favorites = self.settings.clamp_favorites(self.settings.max_favorites);
        self.truncate_to_caps();
    }

    /// Replace the favorites list wholesale (import path; no merge).
    ///
    /// Intra-import duplicate texts collapse to their first occurrence and
    /// entries beyond `max_favorites` are dropped. Imported timestamps are
    /// kept; IDs are re-assigned from the store's counter.
    pub fn replace_favorites(&mut self, clips: Vec<Clip>) {
        let mut replacement: Vec<Clip> = Vec::new();

        for mut clip in clips {
            if clip.text.trim().is_empty() {
                continue;
            }
            if replacement.iter().any(|c| c.text == clip.text) {
                continue;
            }
            if replacement.len() >= self.settings.max_favorites {
                break;
            }
            clip.id = self.next_id;
            self.next_id += 1;
            replacement.push(clip);
        }

        self.favorites = replacement;
    }

    /// Check whether a text is currently favorited (star state for rendering)
    pub fn is_favorite(&self, text: &str) -> bool {
        self.favorites.iter().any(|f| f.text == text)
    }

    /// Take a read-only consistent view of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            recent: self.recent.clone(),
            favorites: self.favorites.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Recent clips, most recent first
    pub fn recent(&self) -> &[Clip] {
        &self.recent
    }

    /// Favorite clips, most recently favorited first
    pub fn favorites(&self) -> &[Clip] {
        &self.favorites
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn truncate_to_caps(&mut self) {
        self.recent.truncate(self.settings.max_clips);
        self.favorites.truncate(self.settings.max_favorites);
    }
}
