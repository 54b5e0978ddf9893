//! Per-entity state as seen by the frontend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The state of a single entity inside the `Hass` states table
///
/// Mirrors the objects delivered by the `get_states` websocket command and
/// `state_changed` subscriptions. Unknown fields (context, etc.) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HassEntity {
    /// The entity this state belongs to (e.g., "group.kitchen")
    pub entity_id: String,

    /// The state value (e.g., "on", "off", "23.5", "unavailable")
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// When the state was last changed
    #[serde(default = "Utc::now")]
    pub last_changed: DateTime<Utc>,

    /// When the state was last updated
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl HassEntity {
    /// Create a new entity state with current timestamps
    pub fn new(
        entity_id: impl Into<String>,
        state: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
        }
    }

    /// Raw attribute value by key
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl PartialEq for HassEntity {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_ignores_timestamps() {
        let a = HassEntity::new("light.a", "on", Map::new());
        let mut b = a.clone();
        b.last_updated = b.last_updated + chrono::Duration::seconds(5);
        assert_eq!(a, b);

        b.state = "off".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_deserialize_websocket_state() {
        let entity: HassEntity = serde_json::from_value(json!({
            "entity_id": "light.porch",
            "state": "unavailable",
            "attributes": {"friendly_name": "Porch"},
            "last_changed": "2026-01-01T10:00:00Z",
            "last_updated": "2026-01-01T10:00:00Z",
            "context": {"id": "01HX", "parent_id": null, "user_id": null}
        }))
        .unwrap();

        assert_eq!(entity.state, "unavailable");
        assert_eq!(entity.attribute("friendly_name"), Some(&json!("Porch")));
    }
}
