//! Session-scoped package archive cache.
//!
//! Downloaded `.nupkg` files are kept on disk for the lifetime of one
//! generator run so repeated requests for the same (id, version) are served
//! locally. The cache lives in a fresh temporary directory that is removed
//! when the cache is dropped; nothing carries over between runs.
//!
//! Layout:
//! ```text
//! <session_root>/
//!   <id-lowercase>/
//!     <version>/
//!       <id-lowercase>.<version>.nupkg
//!       integrity.json
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{RegistryError, Result};
use crate::integrity::ArchiveRecord;

/// An on-disk archive cache bound to one run.
#[derive(Debug)]
pub struct PackageCache {
    dir: TempDir,
}

impl PackageCache {
    /// Create a cache in the system temporary directory.
    pub fn session() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("inbox-cache-")
            .tempdir()
            .map_err(|e| RegistryError::CacheError {
                path: std::env::temp_dir(),
                detail: format!("creating session cache: {e}"),
            })?;
        Ok(PackageCache { dir })
    }

    /// Create a cache below `parent`.
    pub fn session_in(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).map_err(|e| RegistryError::CacheError {
            path: parent.to_path_buf(),
            detail: format!("creating cache parent: {e}"),
        })?;
        let dir = tempfile::Builder::new()
            .prefix("inbox-cache-")
            .tempdir_in(parent)
            .map_err(|e| RegistryError::CacheError {
                path: parent.to_path_buf(),
                detail: format!("creating session cache: {e}"),
            })?;
        Ok(PackageCache { dir })
    }

    /// Root directory of this session's cache.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Whether an archive is cached for `id@version`.
    pub fn contains(&self, id: &str, version: &str) -> bool {
        let dir = self.package_dir(id, version);
        dir.join(archive_name(id, version)).is_file() && dir.join("integrity.json").is_file()
    }

    /// Return the cached archive bytes, if present and intact.
    ///
    /// An entry whose bytes no longer match its integrity record is evicted
    /// and reported as a miss.
    pub fn get(&self, id: &str, version: &str) -> Result<Option<Vec<u8>>> {
        if !self.contains(id, version) {
            return Ok(None);
        }
        let dir = self.package_dir(id, version);
        let record_path = dir.join("integrity.json");
        let record_json =
            std::fs::read_to_string(&record_path).map_err(|e| RegistryError::CacheError {
                path: record_path.clone(),
                detail: format!("reading integrity: {e}"),
            })?;
        let record: ArchiveRecord = serde_json::from_str(&record_json)?;

        let archive_path = dir.join(archive_name(id, version));
        let data = std::fs::read(&archive_path).map_err(|e| RegistryError::CacheError {
            path: archive_path.clone(),
            detail: format!("reading archive: {e}"),
        })?;

        if !record.verify(&data) {
            tracing::warn!(
                id,
                version,
                expected = %record.sha256,
                "cached archive failed integrity check, evicting"
            );
            self.remove(id, version)?;
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Store archive bytes for `id@version`, returning the archive path.
    pub fn store(&self, id: &str, version: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.package_dir(id, version);
        std::fs::create_dir_all(&dir).map_err(|e| RegistryError::CacheError {
            path: dir.clone(),
            detail: format!("creating cache dir: {e}"),
        })?;

        let archive_path = dir.join(archive_name(id, version));
        std::fs::write(&archive_path, data).map_err(|e| RegistryError::CacheError {
            path: archive_path.clone(),
            detail: format!("writing archive: {e}"),
        })?;

        let record = ArchiveRecord::new(id, version, data);
        let record_path = dir.join("integrity.json");
        std::fs::write(&record_path, serde_json::to_string(&record)?).map_err(|e| {
            RegistryError::CacheError {
                path: record_path,
                detail: format!("writing integrity: {e}"),
            }
        })?;

        Ok(archive_path)
    }

    /// Remove a cached archive. Returns whether anything was removed.
    pub fn remove(&self, id: &str, version: &str) -> Result<bool> {
        let dir = self.package_dir(id, version);
        if !dir.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir).map_err(|e| RegistryError::CacheError {
            path: dir,
            detail: format!("removing cache entry: {e}"),
        })?;
        Ok(true)
    }

    fn package_dir(&self, id: &str, version: &str) -> PathBuf {
        self.root()
            .join(id.to_ascii_lowercase())
            .join(version.to_ascii_lowercase())
    }
}

fn archive_name(id: &str, version: &str) -> String {
    format!(
        "{}.{}.nupkg",
        id.to_ascii_lowercase(),
        version.to_ascii_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_get() {
        let cache = PackageCache::session().unwrap();
        assert!(!cache.contains("System.Memory", "4.5.5"));
        assert!(cache.get("System.Memory", "4.5.5").unwrap().is_none());

        let path = cache.store("System.Memory", "4.5.5", b"nupkg").unwrap();
        assert!(path.ends_with("system.memory/4.5.5/system.memory.4.5.5.nupkg"));
        assert!(cache.contains("system.memory", "4.5.5"));
        assert_eq!(
            cache.get("System.Memory", "4.5.5").unwrap().as_deref(),
            Some(&b"nupkg"[..])
        );
    }

    #[test]
    fn tampered_entry_is_evicted() {
        let cache = PackageCache::session().unwrap();
        let path = cache.store("Pkg", "1.0.0", b"original").unwrap();
        std::fs::write(&path, b"tampered").unwrap();

        assert!(cache.get("Pkg", "1.0.0").unwrap().is_none());
        assert!(!cache.contains("Pkg", "1.0.0"));
    }

    #[test]
    fn remove_entry() {
        let cache = PackageCache::session().unwrap();
        cache.store("Pkg", "1.0.0", b"data").unwrap();
        assert!(cache.remove("Pkg", "1.0.0").unwrap());
        assert!(!cache.remove("Pkg", "1.0.0").unwrap());
    }

    #[test]
    fn session_directory_is_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let cache = PackageCache::session_in(parent.path()).unwrap();
            cache.store("Pkg", "1.0.0", b"data").unwrap();
            cache.root().to_path_buf()
        };
        assert!(!root.exists());
    }
}
