//! Error types for row configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or resolving row configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `entity` nor `head` was given
    #[error("no fold head specified")]
    MissingHead,

    /// No child item source resolved to a value
    #[error("no entities specified")]
    MissingItems,

    /// The child item source is not a list
    #[error("entities must be a list")]
    InvalidItems,

    /// A row descriptor is neither a string nor a mapping
    #[error("invalid row configuration: {reason}")]
    InvalidRow { reason: String },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Circular include detected
    #[error("circular include detected: {path}")]
    CircularInclude { path: PathBuf },
}
