use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort provenance recorded at capture time.
/// All fields are optional; captures from restricted contexts carry none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipMeta {
    /// URL of the page the text was copied from
    #[serde(default)]
    pub source_url: Option<String>,
    /// Title of the source page
    #[serde(default)]
    pub source_title: Option<String>,
    /// Name of the source application
    #[serde(default)]
    pub app_name: Option<String>,
}

impl ClipMeta {
    /// Check whether any provenance was recorded
    pub fn is_empty(&self) -> bool {
        self.source_url.is_none() && self.source_title.is_none() && self.app_name.is_none()
    }
}

/// A single captured text entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clip {
    /// Unique identifier (monotonic counter, assigned by the store)
    pub id: u64,
    /// The captured text; deduplication key (exact, case-sensitive)
    pub text: String,
    /// Capture time (favorite entries get a fresh timestamp when starred)
    pub timestamp: DateTime<Utc>,
    /// Best-effort capture provenance
    #[serde(default)]
    pub meta: ClipMeta,
}

impl Clip {
    /// Create a new clip stamped with the current time
    pub fn new(id: u64, text: String, meta: ClipMeta) -> Self {
        Clip {
            id,
            text,
            timestamp: Utc::now(),
            meta,
        }
    }

    /// Get a single-line preview, truncated to `max_len` characters
    pub fn preview(&self, max_len: usize) -> String {
        let line = self.text.lines().next().unwrap_or("");
        if line.chars().count() > max_len {
            let truncated: String = line.chars().take(max_len).collect();
            format!("{}...", truncated)
        } else {
            line.to_string()
        }
    }
}

/// Result of toggling a clip's favorite status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    /// The clip was added to the favorites list
    Added,
    /// The clip was already a favorite and has been removed
    Removed,
    /// The favorites list is full and the account is not pro; nothing changed.
    /// The UI uses this as its upgrade-prompt signal.
    LimitReached,
}
