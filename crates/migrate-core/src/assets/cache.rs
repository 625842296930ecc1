//! Local asset cache.
//!
//! Downloads land in one subdirectory per asset id, each holding the file
//! under its original name. The id level exists because filenames are not
//! unique within an inventory. There is a single writer (the download
//! step) and no concurrent callers, so no locking.

use crate::assets::inventory::Asset;
use std::path::{Path, PathBuf};

/// Handle to the on-disk asset cache directory.
#[derive(Debug, Clone)]
pub struct AssetCache {
    root: PathBuf,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path for one asset, keyed by `(id, filename)`.
    pub fn asset_path(&self, id: &str, filename: &str) -> PathBuf {
        self.root.join(id).join(filename)
    }

    /// Whether a cached copy of this asset exists.
    pub fn contains(&self, id: &str, filename: &str) -> bool {
        self.asset_path(id, filename).exists()
    }

    /// Whether every asset in the inventory is cached locally.
    ///
    /// Vacuously true for an empty inventory. Assets missing an id,
    /// filename, or url are treated as not cached, matching the download
    /// step which cannot fetch them either.
    pub fn all_exist_locally(&self, assets: &[Asset]) -> bool {
        assets.iter().all(|asset| {
            asset.url.is_some()
                && !asset.id.is_empty()
                && !asset.filename.is_empty()
                && self.contains(&asset.id, &asset.filename)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn asset(id: &str, filename: &str) -> Asset {
        Asset {
            id: id.into(),
            filename: filename.into(),
            url: Some(format!("https://cdn/{filename}")),
        }
    }

    fn write_cached(cache: &AssetCache, id: &str, filename: &str) {
        let path = cache.asset_path(id, filename);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"bytes").unwrap();
    }

    #[test]
    fn test_contains_after_write() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(dir.path());

        assert!(!cache.contains("a1", "one.png"));
        write_cached(&cache, "a1", "one.png");
        assert!(cache.contains("a1", "one.png"));
    }

    #[test]
    fn test_all_exist_locally_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(dir.path());
        let assets = vec![asset("a1", "one.png"), asset("a2", "two.jpg")];

        // Same answer twice with no intervening download.
        assert!(!cache.all_exist_locally(&assets));
        assert!(!cache.all_exist_locally(&assets));

        write_cached(&cache, "a1", "one.png");
        assert!(!cache.all_exist_locally(&assets));

        write_cached(&cache, "a2", "two.jpg");
        assert!(cache.all_exist_locally(&assets));
        assert!(cache.all_exist_locally(&assets));
    }

    #[test]
    fn test_asset_without_url_is_never_satisfied() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(dir.path());
        let mut item = asset("a1", "one.png");
        item.url = None;
        write_cached(&cache, "a1", "one.png");
        assert!(!cache.all_exist_locally(&[item]));
    }

    #[test]
    fn test_empty_inventory_is_vacuously_cached() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(dir.path());
        assert!(cache.all_exist_locally(&[]));
    }
}
