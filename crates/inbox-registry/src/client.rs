//! Registry backend trait and local mirror implementation.
//!
//! The `RegistryBackend` trait abstracts over the NuGet feed (HTTP) and a
//! mirror directory on disk. The provided methods turn backend failures into
//! empty results, since a package whose versions cannot be listed simply
//! contributes no in-box entry.

use std::path::{Path, PathBuf};

use inbox_core::NuGetVersion;

use crate::archive::PackageArchive;
use crate::error::{RegistryError, Result};

/// Per-version publication metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub version: NuGetVersion,
    /// Unlisted versions still resolve but are hidden from searches.
    pub listed: bool,
}

/// Abstract package registry.
pub trait RegistryBackend {
    /// Every published version of `id`, in no particular order.
    fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>>;

    /// Publication metadata (listed/unlisted, prerelease) for each version.
    fn catalog(&self, id: &str) -> Result<Vec<CatalogEntry>>;

    /// Download the `.nupkg` bytes for `id@version`.
    fn download(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>>;

    /// Download and open a package archive.
    fn open(&self, id: &str, version: &NuGetVersion) -> Result<PackageArchive> {
        let bytes = self.download(id, version)?;
        PackageArchive::from_bytes(id, version.as_str(), bytes)
    }

    /// Listed stable versions, highest first. Registry failures yield an
    /// empty list.
    fn stable_versions(&self, id: &str) -> Vec<NuGetVersion> {
        match self.catalog(id) {
            Ok(entries) => {
                let mut versions: Vec<NuGetVersion> = entries
                    .into_iter()
                    .filter(|e| e.listed && !e.version.is_prerelease())
                    .map(|e| e.version)
                    .collect();
                versions.sort_by(|a, b| b.cmp(a));
                versions
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "could not list versions");
                Vec::new()
            }
        }
    }

    /// Listed versions including prereleases, highest first. Registry
    /// failures yield an empty list.
    fn listed_versions(&self, id: &str) -> Vec<NuGetVersion> {
        match self.catalog(id) {
            Ok(entries) => {
                let mut versions: Vec<NuGetVersion> = entries
                    .into_iter()
                    .filter(|e| e.listed)
                    .map(|e| e.version)
                    .collect();
                versions.sort_by(|a, b| b.cmp(a));
                versions
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "could not list versions");
                Vec::new()
            }
        }
    }
}

impl<B: RegistryBackend + ?Sized> RegistryBackend for &B {
    fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>> {
        (**self).list_versions(id)
    }

    fn catalog(&self, id: &str) -> Result<Vec<CatalogEntry>> {
        (**self).catalog(id)
    }

    fn download(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>> {
        (**self).download(id, version)
    }
}

/// A registry mirror on the local filesystem.
///
/// Layout:
/// ```text
/// <root>/
///   <id-lowercase>/
///     <version>/
///       <id-lowercase>.<version>.nupkg
///       .unlisted          (optional marker)
/// ```
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    /// Create a local registry rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        LocalRegistry { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add an archive to the mirror.
    pub fn publish(&self, id: &str, version: &str, nupkg: &[u8]) -> Result<PathBuf> {
        let version = NuGetVersion::parse(version)?;
        let dir = self.version_dir(id, &version);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(archive_file(id, &version));
        std::fs::write(&path, nupkg)?;
        Ok(path)
    }

    /// Mark a published version as unlisted.
    pub fn unlist(&self, id: &str, version: &str) -> Result<()> {
        let version = NuGetVersion::parse(version)?;
        let dir = self.version_dir(id, &version);
        if !dir.is_dir() {
            return Err(RegistryError::VersionNotFound {
                id: id.to_string(),
                version: version.to_string(),
            });
        }
        std::fs::write(dir.join(".unlisted"), b"")?;
        Ok(())
    }

    fn package_dir(&self, id: &str) -> PathBuf {
        self.root.join(id.to_ascii_lowercase())
    }

    fn version_dir(&self, id: &str, version: &NuGetVersion) -> PathBuf {
        self.package_dir(id).join(version.normalized())
    }
}

fn archive_file(id: &str, version: &NuGetVersion) -> String {
    format!("{}.{}.nupkg", id.to_ascii_lowercase(), version.normalized())
}

impl RegistryBackend for LocalRegistry {
    fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>> {
        Ok(self.catalog(id)?.into_iter().map(|e| e.version).collect())
    }

    fn catalog(&self, id: &str) -> Result<Vec<CatalogEntry>> {
        let package_dir = self.package_dir(id);
        if !package_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&package_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Ok(version) = NuGetVersion::parse(&name) {
                entries.push(CatalogEntry {
                    listed: !path.join(".unlisted").exists(),
                    version,
                });
            }
        }
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(entries)
    }

    fn download(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>> {
        let path = self.version_dir(id, version).join(archive_file(id, version));
        if !path.is_file() {
            return Err(RegistryError::VersionNotFound {
                id: id.to_string(),
                version: version.to_string(),
            });
        }
        Ok(std::fs::read(path)?)
    }
}
