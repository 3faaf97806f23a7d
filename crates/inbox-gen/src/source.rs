//! Where the generator gets package data from.
//!
//! [`PackageSource`] is the seam between the table-building algorithms and
//! the registry. [`RegistrySource`] adapts any [`RegistryBackend`]; tests
//! substitute an in-memory source.

use inbox_core::{Framework, NuGetVersion};
use inbox_registry::{
    resolve_asset_versions, AssetVersion, PackageArchive, RegistryBackend, RegistryError,
};

/// Package listing, download, and asset inspection.
pub trait PackageSource {
    /// Listed stable versions, highest first. Empty when the registry has
    /// nothing or cannot be reached.
    fn stable_versions(&self, id: &str) -> Vec<NuGetVersion>;

    /// Listed versions including prereleases, highest first.
    fn listed_versions(&self, id: &str) -> Vec<NuGetVersion>;

    /// Download and open `id@version`.
    fn open(&self, id: &str, version: &NuGetVersion) -> Result<PackageArchive, RegistryError>;

    /// Versions of the binaries `id@version` would contribute to an
    /// application targeting `framework`.
    fn asset_versions(
        &self,
        id: &str,
        version: &NuGetVersion,
        framework: &Framework,
    ) -> Result<Vec<AssetVersion>, RegistryError> {
        let archive = self.open(id, version)?;
        resolve_asset_versions(&archive, framework)
    }
}

/// A [`PackageSource`] backed by a registry.
pub struct RegistrySource<B> {
    backend: B,
}

impl<B: RegistryBackend> RegistrySource<B> {
    pub fn new(backend: B) -> Self {
        RegistrySource { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: RegistryBackend> PackageSource for RegistrySource<B> {
    fn stable_versions(&self, id: &str) -> Vec<NuGetVersion> {
        self.backend.stable_versions(id)
    }

    fn listed_versions(&self, id: &str) -> Vec<NuGetVersion> {
        self.backend.listed_versions(id)
    }

    fn open(&self, id: &str, version: &NuGetVersion) -> Result<PackageArchive, RegistryError> {
        self.backend.open(id, version)
    }
}
