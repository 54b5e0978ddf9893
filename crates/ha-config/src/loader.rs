//! YAML loader for dashboard row configuration
//!
//! Dashboard configuration is JSON-shaped, so YAML input is converted into
//! `serde_json::Value` trees. Supported tags:
//! - `!include path` - Include another YAML file, relative to the including file

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader producing JSON-shaped row configuration
pub struct RowConfigLoader {
    /// Base directory for resolving relative paths
    config_dir: PathBuf,
    /// Track included files to detect circular includes
    include_stack: HashSet<PathBuf>,
}

impl RowConfigLoader {
    /// Create a new loader for the given config directory
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            include_stack: HashSet::new(),
        }
    }

    /// Load and convert a YAML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading row configuration: {:?}", path);

        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.insert(path.clone());
        let result = self.load_str(&content, &path);
        self.include_stack.remove(&path);

        result
    }

    /// Load and convert YAML from a string
    pub fn load_str(&mut self, content: &str, source_path: &Path) -> ConfigResult<Value> {
        let value: YamlValue =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                path: source_path.to_path_buf(),
                source: e,
            })?;

        self.convert(value, source_path)
    }

    /// Convert a YAML value into its JSON counterpart, expanding tags
    fn convert(&mut self, value: YamlValue, source_path: &Path) -> ConfigResult<Value> {
        match value {
            YamlValue::Null => Ok(Value::Null),
            YamlValue::Bool(b) => Ok(Value::Bool(b)),
            YamlValue::Number(n) => Ok(convert_number(&n)),
            YamlValue::String(s) => Ok(Value::String(s)),
            YamlValue::Sequence(seq) => {
                let result: ConfigResult<Vec<Value>> = seq
                    .into_iter()
                    .map(|v| self.convert(v, source_path))
                    .collect();
                Ok(Value::Array(result?))
            }
            YamlValue::Mapping(mapping) => {
                let mut result = Map::new();
                for (k, v) in mapping {
                    let key = mapping_key(&k)?;
                    result.insert(key, self.convert(v, source_path)?);
                }
                Ok(Value::Object(result))
            }
            YamlValue::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                trace!("Processing tag '{}' with value {:?}", tag, tagged.value);

                match tag.as_str() {
                    "!include" => {
                        let include_path = self.value_to_path(&tagged.value, source_path)?;
                        debug!("Including file: {:?}", include_path);
                        self.load_file(&include_path)
                    }
                    _ => Err(ConfigError::InvalidValue {
                        key: tag,
                        reason: "unsupported YAML tag".to_string(),
                    }),
                }
            }
        }
    }

    /// Convert a YAML value to a path, resolving relative to source file
    fn value_to_path(&self, value: &YamlValue, source_path: &Path) -> ConfigResult<PathBuf> {
        let path_str = value.as_str().ok_or_else(|| ConfigError::InvalidValue {
            key: "!include".to_string(),
            reason: "path must be a string".to_string(),
        })?;

        let base_dir = source_path.parent().unwrap_or(&self.config_dir);
        let resolved = if Path::new(path_str).is_absolute() {
            PathBuf::from(path_str)
        } else {
            base_dir.join(path_str)
        };

        Ok(resolved)
    }

    /// Resolve a path relative to the config directory
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

fn convert_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // NaN and infinities have no JSON representation
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// JSON objects only have string keys; scalars are stringified
fn mapping_key(key: &YamlValue) -> ConfigResult<String> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::InvalidValue {
            key: format!("{:?}", other),
            reason: "mapping keys must be scalars".to_string(),
        }),
    }
}

/// Load a YAML row configuration file
pub fn load_row_config(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    let mut loader = RowConfigLoader::new(config_dir);
    loader.load_file(file)
}

/// Load a YAML row configuration from a string
pub fn load_row_config_str(
    config_dir: impl Into<PathBuf>,
    content: &str,
    source_name: &str,
) -> ConfigResult<Value> {
    let mut loader = RowConfigLoader::new(config_dir);
    loader.load_str(content, Path::new(source_name))
}
