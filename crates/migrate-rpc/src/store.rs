//! Wizard state persistence.
//!
//! One small JSON file written atomically: serialize to a temp file,
//! fsync, rename over the target. A missing or corrupt file reads as a
//! fresh state rather than an error.

use anyhow::{Context, Result};
use migrate_core::WizardState;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing::warn;

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted state, defaulting when absent or unreadable.
    pub fn load(&self) -> WizardState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return WizardState::new(),
        };
        match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file corrupt, starting fresh");
                WizardState::new()
            }
        }
    }

    /// Persist the state atomically.
    pub fn save(&self, state: WizardState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let temp_path = self.path.with_extension(format!("json.{}.tmp", process::id()));
        let serialized = serde_json::to_string_pretty(&state)?;

        let mut file = File::create(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        file.write_all(serialized.as_bytes())
            .with_context(|| format!("writing {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("syncing {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            anyhow::anyhow!("renaming to {}: {e}", self.path.display())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert_eq!(store.load(), WizardState::new());

        let state = WizardState::new().with_fetched().with_downloaded();
        store.save(state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_corrupt_file_reads_as_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = StateStore::new(&path);
        assert_eq!(store.load(), WizardState::new());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        store.save(WizardState::new().with_fetched()).unwrap();
        assert!(store.load().fetched);
    }
}
