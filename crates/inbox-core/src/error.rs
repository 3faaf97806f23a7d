//! Core error types.

/// Errors raised while parsing frameworks, families, and versions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A target framework moniker could not be parsed.
    #[error("invalid target framework: '{value}'")]
    InvalidFramework { value: String },

    /// A package or assembly version could not be parsed.
    #[error("invalid version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    /// A framework family key is not recognized.
    #[error("unknown framework family: '{value}'")]
    UnknownFamily { value: String },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
