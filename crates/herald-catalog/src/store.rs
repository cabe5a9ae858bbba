//! File-based catalog store — lightweight persistence.
//! The catalog is saved as one pretty-printed JSON file, rewritten on every
//! change. Best effort, last write wins.

use std::path::{Path, PathBuf};

use herald_core::error::{HeraldError, Result};

use crate::Catalog;

/// Flat-file catalog store.
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            path: dir.to_path_buf(),
        }
    }

    /// Default store directory (~/.herald).
    pub fn default_path() -> PathBuf {
        herald_core::HeraldConfig::home_dir()
    }

    fn file(&self) -> PathBuf {
        self.path.join("catalog.json")
    }

    /// Save the catalog to disk.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let file = self.file();
        let json = serde_json::to_string_pretty(catalog)
            .map_err(|e| HeraldError::Storage(format!("Serialize error: {e}")))?;
        std::fs::write(&file, &json)
            .map_err(|e| HeraldError::Storage(format!("Write error: {e}")))?;
        tracing::debug!("Saved {} payloads to {}", catalog.len(), file.display());
        Ok(())
    }

    /// Load the catalog from disk. A missing or unreadable file yields an
    /// empty catalog rather than an error.
    pub fn load(&self) -> Catalog {
        let file = self.file();
        if !file.exists() {
            return Catalog::new();
        }
        match std::fs::read_to_string(&file) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {}: {e}", file.display());
                Catalog::new()
            }),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", file.display());
                Catalog::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = std::env::temp_dir().join("herald-test-store-missing");
        let store = CatalogStore::new(&dir);
        assert!(store.load().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir().join("herald-test-store-roundtrip");
        let store = CatalogStore::new(&dir);
        let mut catalog = Catalog::new();
        catalog.add("hello");
        let deleted = catalog.add("gone");
        catalog.remove(deleted);
        store.save(&catalog).unwrap();

        let mut loaded = store.load();
        assert_eq!(loaded.len(), 1);
        // The id counter survives the roundtrip: no reuse of the deleted id.
        assert_eq!(loaded.add("new"), deleted + 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = std::env::temp_dir().join("herald-test-store-corrupt");
        let store = CatalogStore::new(&dir);
        std::fs::write(dir.join("catalog.json"), "not json").unwrap();
        assert!(store.load().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
