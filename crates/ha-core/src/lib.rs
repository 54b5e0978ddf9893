//! Core types for the Home Assistant frontend
//!
//! This crate provides the live state object that dashboard elements are
//! handed by the frontend (`Hass`) and the per-entity state it carries
//! (`HassEntity`). Row elements receive a `Hass` after creation and again
//! every time it is replaced.

mod hass;
mod state;

pub use hass::{Hass, SharedHass};
pub use state::HassEntity;

/// Attribute holding the member list of a group entity
pub const ATTR_ENTITY_ID: &str = "entity_id";
