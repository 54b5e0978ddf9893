//! Dashboard row configuration for Home Assistant
//!
//! This crate provides:
//!
//! - `RowConfig` - a normalized row descriptor (string shorthand expanded)
//! - YAML loading of dashboard configuration into JSON-shaped values,
//!   with support for the `!include path` tag used by YAML-mode dashboards
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_row_config, RowConfig};
//!
//! let raw = load_row_config("/config", "fold.yaml")?;
//! let head = RowConfig::from_value(&raw["head"])?;
//! ```

mod error;
mod loader;
mod row_config;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_row_config, load_row_config_str, RowConfigLoader};
pub use row_config::RowConfig;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
