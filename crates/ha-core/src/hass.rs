//! The live `hass` object handed to dashboard elements

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{HassEntity, ATTR_ENTITY_ID};

/// Snapshot of the frontend connection state
///
/// The frontend replaces this object wholesale whenever anything changes;
/// elements never mutate it, they only receive the new snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hass {
    /// All entity states keyed by entity_id string
    #[serde(default)]
    pub states: HashMap<String, HassEntity>,
}

/// The form in which `Hass` snapshots are shared between elements
pub type SharedHass = Arc<Hass>;

impl Hass {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list of entity states
    pub fn from_states(states: impl IntoIterator<Item = HassEntity>) -> Self {
        Self {
            states: states
                .into_iter()
                .map(|s| (s.entity_id.clone(), s))
                .collect(),
        }
    }

    /// Get the current state of an entity
    pub fn state(&self, entity_id: &str) -> Option<&HassEntity> {
        self.states.get(entity_id)
    }

    /// Raw member list of a group entity
    ///
    /// Returns the `entity_id` attribute exactly as stored, so callers can
    /// tell a missing entity or attribute apart from a malformed one.
    pub fn group_members(&self, entity_id: &str) -> Option<&Value> {
        self.state(entity_id)
            .and_then(|s| s.attribute(ATTR_ENTITY_ID))
            .filter(|v| !v.is_null())
    }

    /// Get the total number of entities
    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn group(entity_id: &str, members: Value) -> HassEntity {
        let mut attributes = Map::new();
        attributes.insert(ATTR_ENTITY_ID.to_string(), members);
        HassEntity::new(entity_id, "on", attributes)
    }

    #[test]
    fn test_group_members() {
        let hass = Hass::from_states([
            group("group.kitchen", json!(["light.a", "light.b"])),
            HassEntity::new("light.a", "on", Map::new()),
        ]);

        assert_eq!(
            hass.group_members("group.kitchen"),
            Some(&json!(["light.a", "light.b"]))
        );
        assert_eq!(hass.group_members("light.a"), None);
        assert_eq!(hass.group_members("group.missing"), None);
        assert_eq!(hass.entity_count(), 2);
    }

    #[test]
    fn test_group_members_keeps_malformed_value() {
        let hass = Hass::from_states([group("group.odd", json!("light.a"))]);
        assert_eq!(hass.group_members("group.odd"), Some(&json!("light.a")));
    }
}
