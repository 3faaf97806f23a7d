//! Generator errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a generator run.
#[derive(Debug, Error)]
pub enum GenError {
    /// A framework reference package has neither `ref/` nor `build/`
    /// assemblies, so no baseline can be established.
    #[error("unexpected framework package format: {id}@{version} has no reference assemblies")]
    UnexpectedPackageFormat { id: String, version: String },

    #[error("no frameworks configured")]
    NoFrameworks,

    #[error("failed to write {path}: {detail}")]
    Emit { path: PathBuf, detail: String },

    #[error(transparent)]
    Registry(#[from] inbox_registry::RegistryError),

    #[error(transparent)]
    Core(#[from] inbox_core::CoreError),
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GenError>;
