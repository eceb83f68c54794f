use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::Clip;

/// Default export filename for the favorites list
pub const EXPORT_FILENAME: &str = "clipmaster-favorites.json";

/// Serialize the favorites list to a flat JSON array at `path`
pub fn export_favorites(favorites: &[Clip], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(favorites)
        .with_context(|| "Failed to serialize favorites")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }

    fs::write(path, json).with_context(|| format!("Failed to write favorites to {:?}", path))?;

    log::info!("Exported {} favorites to {:?}", favorites.len(), path);
    Ok(())
}

/// Parse a favorites export file.
///
/// The whole file is parsed before anything is returned, so a structurally
/// invalid file never causes a partial import. Callers replace the favorites
/// list wholesale with the returned clips.
pub fn import_favorites(path: &Path) -> Result<Vec<Clip>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read favorites file {:?}", path))?;

    let clips: Vec<Clip> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid favorites file {:?}", path))?;

    log::info!("Parsed {} favorites from {:?}", clips.len(), path);
    Ok(clips)
}
