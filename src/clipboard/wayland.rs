use anyhow::{Context, Result, anyhow};
use std::process::{Command, Stdio};

use super::backend::ClipboardBackend;

/// Wayland clipboard backend using wl-clipboard tools
/// Requires wl-copy and wl-paste to be installed
pub struct WaylandBackend;

impl WaylandBackend {
    /// Create a new Wayland clipboard backend
    pub fn new() -> Result<Self> {
        // Verify wl-copy is available
        Command::new("wl-copy")
            .arg("--version")
            .output()
            .context("wl-copy not found. Install wl-clipboard package")?;

        log::debug!("WaylandBackend initialized successfully");
        Ok(WaylandBackend)
    }
}

impl ClipboardBackend for WaylandBackend {
    fn read_text(&self) -> Result<Option<String>> {
        let output = Command::new("wl-paste")
            .arg("--no-newline")
            .arg("--type")
            .arg("text")
            .stdin(Stdio::null())
            .output()
            .context("Failed to spawn wl-paste")?;

        if !output.status.success() {
            // wl-paste exits non-zero when the clipboard is empty or holds
            // no text offer; both are "nothing to capture"
            return Ok(None);
        }

        let text = String::from_utf8(output.stdout).context("Clipboard text is not valid UTF-8")?;

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new("wl-copy")
            .arg("--type")
            .arg("text/plain")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn wl-copy")?;

        let status = child.wait().context("Failed to wait for wl-copy")?;

        if !status.success() {
            return Err(anyhow!("wl-copy failed with status: {}", status));
        }

        log::debug!("Wrote {} bytes text to clipboard", text.len());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Wayland"
    }
}
