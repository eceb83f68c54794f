use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::models::{ClipStore, Settings};

/// Trait for clip store persistence.
///
/// Every mutation path goes load -> mutate -> save through this trait, which
/// is what approximates mutual exclusion between the background watcher and a
/// foreground session: each writer reads the latest persisted state
/// immediately before writing. Last write wins; this is best-effort, not a
/// transactional guarantee.
pub trait StateStorage: Send + Sync {
    /// Load the clip store from storage
    fn load(&self) -> Result<ClipStore>;

    /// Save the clip store to storage
    fn save(&self, store: &ClipStore) -> Result<()>;

    /// Get the storage file path
    fn path(&self) -> &PathBuf;
}

/// Bincode-based implementation of StateStorage
/// Uses atomic write pattern with .tmp file for safety
pub struct BincodeStateStorage {
    path: PathBuf,
    default_settings: Settings,
}

impl BincodeStateStorage {
    /// Create a new BincodeStateStorage with the given path and the settings
    /// used when no state file exists yet
    pub fn new(path: PathBuf, default_settings: Settings) -> Self {
        BincodeStateStorage {
            path,
            default_settings,
        }
    }
}

impl StateStorage for BincodeStateStorage {
    fn load(&self) -> Result<ClipStore> {
        // If file doesn't exist, return an empty store
        if !self.path.exists() {
            log::info!(
                "State file not found at {:?}, starting with an empty store",
                self.path
            );
            return Ok(ClipStore::new(self.default_settings.clone()));
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read state from {:?}", self.path))?;

        match bincode::serde::decode_from_slice::<ClipStore, _>(&bytes, bincode::config::standard())
        {
            Ok((store, _bytes_read)) => {
                log::info!(
                    "Loaded {} recent / {} favorite clips from {:?}",
                    store.recent().len(),
                    store.favorites().len(),
                    self.path
                );
                Ok(store)
            }
            Err(e) => {
                // Corrupted file - back it up and start fresh
                let backup_path = self.path.with_extension("bin.corrupted");
                log::warn!(
                    "State file corrupted, backing up to {:?}: {}",
                    backup_path,
                    e
                );

                if let Err(backup_err) = fs::rename(&self.path, &backup_path) {
                    log::error!("Failed to backup corrupted file: {}", backup_err);
                }

                Ok(ClipStore::new(self.default_settings.clone()))
            }
        }
    }

    fn save(&self, store: &ClipStore) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(store, bincode::config::standard())
            .with_context(|| "Failed to serialize clip store")?;

        // Atomic write pattern: write to .tmp, then rename
        let tmp_path = self.path.with_extension("bin.tmp");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&tmp_path, &bytes)
            .with_context(|| format!("Failed to write to temporary file {:?}", tmp_path))?;

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, self.path))?;

        log::debug!(
            "Saved {} recent / {} favorite clips to {:?}",
            store.recent().len(),
            store.favorites().len(),
            self.path
        );

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }
}
