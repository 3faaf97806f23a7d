//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Package not found in the registry.
    #[error("package not found: {id}")]
    PackageNotFound { id: String },

    /// Requested version not found.
    #[error("version {version} not found for package '{id}'")]
    VersionNotFound { id: String, version: String },

    /// The registry answered with an error or could not be reached.
    #[error("request to {url} failed: {detail}")]
    Http {
        url: String,
        status: Option<u16>,
        detail: String,
    },

    /// A registry response did not have the expected shape.
    #[error("malformed registry response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },

    /// The package archive could not be opened or read.
    #[error("invalid package archive '{id}@{version}': {detail}")]
    InvalidArchive {
        id: String,
        version: String,
        detail: String,
    },

    /// A binary is not a readable .NET assembly.
    #[error("invalid assembly: {detail}")]
    InvalidAssembly { detail: String },

    /// The `.nuspec` manifest could not be parsed.
    #[error("invalid nuspec: {detail}")]
    InvalidNuspec { detail: String },

    /// Cache I/O error.
    #[error("cache error at {path}: {detail}")]
    CacheError { path: PathBuf, detail: String },

    /// Version or framework parse error.
    #[error(transparent)]
    Core(#[from] inbox_core::CoreError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
