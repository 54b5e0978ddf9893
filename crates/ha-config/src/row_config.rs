//! Normalized row descriptor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// A single dashboard row configuration
///
/// Rows are free-form mappings; the only fields given meaning here are
/// `entity`, `type` and `tap_action`. A bare string in a row list is
/// shorthand for `{entity: <string>}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowConfig(Map<String, Value>);

impl RowConfig {
    /// Create an empty row configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Row configuration referring to a single entity
    pub fn for_entity(entity_id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("entity".to_string(), Value::String(entity_id.into()));
        Self(map)
    }

    /// Normalize a raw row value
    ///
    /// Strings expand to `{entity: s}`, mappings are taken as-is, anything
    /// else is rejected.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        match value {
            Value::String(entity_id) => Ok(Self::for_entity(entity_id.clone())),
            Value::Object(map) => Ok(Self(map.clone())),
            other => Err(ConfigError::InvalidRow {
                reason: format!("expected a string or a mapping, got {}", other),
            }),
        }
    }

    /// Normalize a raw row list
    ///
    /// A defined value that is not a sequence yields
    /// [`ConfigError::InvalidItems`].
    pub fn list_from_value(value: &Value) -> ConfigResult<Vec<Self>> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            _ => Err(ConfigError::InvalidItems),
        }
    }

    /// Shallow merge of several mappings, later layers win
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let mut map = Map::new();
        for layer in layers {
            for (key, value) in layer {
                map.insert(key.clone(), value.clone());
            }
        }
        Self(map)
    }

    /// The `entity` reference, if present
    pub fn entity(&self) -> Option<&str> {
        self.0.get("entity").and_then(Value::as_str)
    }

    /// The explicit `tap_action`, if present
    pub fn tap_action(&self) -> Option<&Value> {
        self.0.get("tap_action").filter(|v| !v.is_null())
    }

    /// Get a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RowConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RowConfig> for Value {
    fn from(config: RowConfig) -> Value {
        Value::Object(config.0)
    }
}
