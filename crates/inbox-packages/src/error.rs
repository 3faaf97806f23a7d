//! Registry construction errors.

use inbox_core::{CoreError, FrameworkFamily};
use thiserror::Error;

/// Errors raised while building a [`FrameworkPackageRegistry`](crate::FrameworkPackageRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackagesError {
    #[error("{family} table for {framework} inherits from {parent}, which is not registered")]
    MissingParent {
        family: FrameworkFamily,
        framework: String,
        parent: String,
    },

    #[error("{family} tables form a parent cycle through {framework}")]
    ParentCycle {
        family: FrameworkFamily,
        framework: String,
    },

    #[error("{family} table for {framework} is registered twice")]
    Duplicate {
        family: FrameworkFamily,
        framework: String,
    },

    #[error("invalid version '{version}' for {package} in {framework}")]
    InvalidVersion {
        framework: String,
        package: String,
        version: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, PackagesError>;
