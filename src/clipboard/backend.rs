use anyhow::Result;

/// Trait for clipboard backend abstraction
/// Supports different clipboard systems (Wayland now, X11 later)
///
/// Reads feed the polling watcher; writes copy a selected clip back to the
/// clipboard. Read failures are expected in restricted contexts and are
/// treated by callers as "no change", never as fatal.
pub trait ClipboardBackend: Send + Sync {
    /// Read the current clipboard text.
    /// `Ok(None)` means the clipboard is empty or holds non-text content.
    fn read_text(&self) -> Result<Option<String>>;

    /// Write text to clipboard
    fn write_text(&self, text: &str) -> Result<()>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}
