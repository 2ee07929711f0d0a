//! Single-slot snapshot persistence.
//!
//! Best-effort by contract: failures are logged and swallowed, never returned
//! to the caller. A missing, unreadable or incompatible save reads as absent.

use anyhow::{Context, Result};
use siege_core::{GameState, SCHEMA_VERSION};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed, versioned save key.
pub const SAVE_FILE_NAME: &str = "siege_save_v1.json";

#[derive(Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(save_dir: impl AsRef<Path>) -> Self {
        Self {
            path: save_dir.as_ref().join(SAVE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, state: &GameState) {
        match self.try_save(state) {
            Ok(()) => tracing::info!(cycle = state.cycle, path = %self.path.display(), "game saved"),
            Err(err) => tracing::warn!("save failed: {err:#}"),
        }
    }

    /// Temp file then rename, so a crash never leaves a half-written save.
    fn try_save(&self, state: &GameState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating save directory {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(state).context("serializing game state")?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file =
            std::fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }

    pub fn load(&self) -> Option<GameState> {
        if !self.exists() {
            return None;
        }
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "reading save failed: {err}");
                return None;
            }
        };
        let state: GameState = match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "save is not a valid snapshot: {err}");
                return None;
            }
        };
        if state.meta.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                found = state.meta.schema_version,
                expected = SCHEMA_VERSION,
                "ignoring save with incompatible schema"
            );
            return None;
        }
        tracing::info!(cycle = state.cycle, "game loaded");
        Some(state)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn clear(&self) {
        if !self.exists() {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "clearing save failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::test_fixtures::{base_content, base_state};
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_returns_same_state() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        let content = base_content();
        let state = base_state(&content);

        assert!(!store.exists());
        store.save(&state);
        assert!(store.exists());
        assert_eq!(store.load(), Some(state));
        assert!(!dir.path().join("siege_save_v1.json.tmp").exists());
    }

    #[test]
    fn test_missing_save_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupt_save_is_absent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SAVE_FILE_NAME), "{ not json").unwrap();
        let store = SaveStore::new(dir.path());
        assert!(store.exists());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_other_schema_version_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        let content = base_content();
        let mut state = base_state(&content);
        state.meta.schema_version = SCHEMA_VERSION + 1;
        store.save(&state);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_removes_save() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path());
        let content = base_content();
        store.save(&base_state(&content));
        store.clear();
        assert!(!store.exists());
        // clearing twice is harmless
        store.clear();
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = SaveStore::new(dir.path().join("nested").join("slot"));
        let content = base_content();
        store.save(&base_state(&content));
        assert!(store.exists());
    }
}
