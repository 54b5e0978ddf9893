//! Fold row configuration and child item resolution

use ha_config::{ConfigError, ConfigResult, RowConfig};
use ha_core::Hass;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Indentation of child rows when `padding` is not given, in px
pub const DEFAULT_PADDING: f64 = 24.0;

/// Raw shape of the card configuration before normalization
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFoldRowConfig {
    open: bool,
    entity: Option<String>,
    head: Option<Value>,
    entities: Option<Value>,
    items: Option<Value>,
    group_config: Option<Map<String, Value>>,
    padding: Option<f64>,
    clickable: Option<bool>,
    state_color: Option<bool>,
    mute: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Normalized fold row configuration
///
/// Immutable once built; a new `set_config` replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldRowConfig {
    /// Initial open state
    pub open: bool,
    /// Normalized head descriptor (`entity` wins over `head`)
    pub head: RowConfig,
    pub entities: Option<Value>,
    /// Legacy spelling of `entities`
    pub items: Option<Value>,
    /// Defaults merged into every child row, never the head
    pub group_config: Map<String, Value>,
    pub padding: f64,
    /// Explicit clickability; `None` means derived from the head
    pub clickable: Option<bool>,
    pub state_color: Option<bool>,
    pub mute: bool,
    /// Keys not interpreted by the fold row (`type`, `card_mod`, ...)
    pub extra: Map<String, Value>,
}

impl FoldRowConfig {
    /// Normalize a raw card configuration
    pub fn from_value(raw: &Value) -> ConfigResult<Self> {
        let raw = RawFoldRowConfig::deserialize(raw).map_err(|e| ConfigError::InvalidValue {
            key: "fold-entity-row".to_string(),
            reason: e.to_string(),
        })?;

        let head = match (raw.entity, raw.head) {
            (Some(entity), _) => RowConfig::for_entity(entity),
            (None, Some(head)) if !head.is_null() => RowConfig::from_value(&head)?,
            _ => return Err(ConfigError::MissingHead),
        };

        Ok(Self {
            open: raw.open,
            head,
            entities: raw.entities.filter(|v| !v.is_null()),
            items: raw.items.filter(|v| !v.is_null()),
            group_config: raw.group_config.unwrap_or_default(),
            padding: raw.padding.unwrap_or(DEFAULT_PADDING),
            clickable: raw.clickable,
            state_color: raw.state_color,
            mute: raw.mute,
            extra: raw.extra,
        })
    }

    /// Whether the head itself toggles the fold
    ///
    /// Unless set explicitly, only plain heads (no entity, no tap action)
    /// are clickable, so rows with their own tap behavior keep it.
    pub fn clickable(&self) -> bool {
        self.clickable
            .unwrap_or_else(|| self.head.entity().is_none() && self.head.tap_action().is_none())
    }

    /// Select the child item source
    pub fn item_source(&self) -> ItemSource<'_> {
        if let Some(entities) = &self.entities {
            ItemSource::Entities(entities)
        } else if let Some(items) = &self.items {
            ItemSource::Items(items)
        } else if let Some(entity) = self.head.entity() {
            ItemSource::Group(entity)
        } else {
            ItemSource::Missing
        }
    }
}

/// Where the child rows come from, in priority order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemSource<'a> {
    Entities(&'a Value),
    Items(&'a Value),
    /// Members of the group referenced by the head entity
    Group(&'a str),
    Missing,
}

impl ItemSource<'_> {
    /// Whether resolving this source needs `hass`
    pub fn needs_hass(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Resolve the source into row descriptors
    ///
    /// An explicitly empty list is a valid source with no rows.
    pub fn resolve(&self, hass: Option<&Hass>) -> ConfigResult<Vec<RowConfig>> {
        let value = match self {
            Self::Entities(value) | Self::Items(value) => Some(*value),
            Self::Group(entity_id) => hass.and_then(|h| h.group_members(entity_id)),
            Self::Missing => None,
        };

        match value {
            Some(value) => RowConfig::list_from_value(value),
            None => Err(ConfigError::MissingItems),
        }
    }
}
