//! Error types for the fold row

use std::sync::Arc;

use ha_config::ConfigError;
use thiserror::Error;

/// Result type for fold row operations
pub type FoldRowResult<T> = Result<T, FoldRowError>;

/// Errors surfaced by the fold row
///
/// Failed loads are cached and handed to every awaiter, so the error is
/// cheaply cloneable.
#[derive(Debug, Clone, Error)]
pub enum FoldRowError {
    /// Invalid or incomplete configuration
    #[error(transparent)]
    Config(Arc<ConfigError>),

    /// An operation needed a configuration but `set_config` never succeeded
    #[error("fold row is not configured")]
    NotConfigured,

    /// The row was torn down while waiting for `hass`
    #[error("hass was never supplied")]
    ContextDropped,
}

impl FoldRowError {
    /// The underlying configuration error, if any
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ConfigError> for FoldRowError {
    fn from(err: ConfigError) -> Self {
        Self::Config(Arc::new(err))
    }
}
