//! NuGet registry access for the in-box table generator.
//!
//! Lists published versions, downloads package archives, and reads the
//! parts of an archive the generator cares about: reference assemblies,
//! `runtime.json`, `data/PackageOverrides.txt`, platform manifests, and the
//! `.nuspec` dependency groups.
//!
//! # Architecture
//!
//! - [`RegistryBackend`] abstracts the registry; [`HttpRegistry`] talks to
//!   a NuGet v3 feed and [`LocalRegistry`] serves a mirror directory.
//! - [`PackageCache`] keeps downloaded archives for the duration of one run,
//!   guarded by content hashes.
//! - [`PackageArchive`] opens a `.nupkg` and exposes its entries.
//! - [`assembly`] reads assembly and file versions out of PE images.

pub mod archive;
pub mod assembly;
pub mod assets;
pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod integrity;
pub mod nuspec;
pub mod runtime_json;

// Re-exports for convenience.
pub use archive::{OverrideRecord, PackageArchive, PlatformManifestEntry};
pub use assembly::read_version_pair;
pub use assets::{resolve_asset_versions, AssetVersion};
pub use cache::PackageCache;
pub use client::{CatalogEntry, LocalRegistry, RegistryBackend};
pub use error::{RegistryError, Result};
pub use http::{HttpRegistry, HttpRegistryConfig};
pub use integrity::ContentHash;
pub use nuspec::{DependencyGroup, PackageDependency};
pub use runtime_json::RuntimeGraph;
