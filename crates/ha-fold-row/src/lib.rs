//! Collapsible fold row for Home Assistant dashboards
//!
//! A fold row is a head row that shows or hides a list of child rows. Rows
//! themselves are opaque elements built by the dashboard's row factory; the
//! fold row decides which rows to build, builds them at most once per
//! configuration, animates the container open and closed, and keeps every
//! row supplied with the latest `hass`.
//!
//! Child rows come from exactly one of, in priority order:
//! - `entities` - an explicit row list
//! - `items` - the legacy spelling of `entities`
//! - the `entity_id` attribute of the group entity in the head
//!
//! # Example
//!
//! ```ignore
//! use ha_fold_row::{memory::MemoryHost, FoldEntityRow};
//!
//! let host = MemoryHost::new();
//! let row = FoldEntityRow::new(host.fold_host());
//! row.set_config(&serde_json::json!({
//!     "head": {"type": "section", "label": "Lights"},
//!     "entities": ["light.kitchen", "light.hall"],
//! }))?;
//! row.toggle().await?;
//! ```

use std::sync::{Mutex, MutexGuard};

mod context;
mod error;
mod factory;
mod host;
pub mod memory;
mod pipeline;
mod registry;
mod resolver;
mod row;
mod toggle;
mod view;

pub use context::HassSlot;
pub use error::{FoldRowError, FoldRowResult};
pub use factory::{resolve_state_color, RowFactoryAdapter};
pub use host::{
    same_element, ActionHandler, ActionHandlerOptions, FoldHost, FoldLayout, Height,
    NestedElement, Overflow, ParentCard, ParentCardLookup, RowElement, RowFactory, RowHandle,
    RowList, RowStyler, StyleRequest, SubtreeQuery, ROW_STYLE_SLOT,
};
pub use pipeline::{HeadBinding, HEAD_ACTION_TARGET, TOGGLE_LABEL};
pub use registry::{define_fold_row, ElementConstructor, ElementRegistry, FOLD_ROW_ELEMENT};
pub use resolver::{FoldRowConfig, ItemSource, DEFAULT_PADDING};
pub use row::{FoldEntityRow, FoldEvent, Placement};
pub use toggle::{FoldPhase, ToggleState};
pub use view::{ContainerView, FoldView, ToggleAffordance};

/// Lock a mutex, taking the data back if a previous holder panicked
///
/// None of the guarded state can be left half-updated by a panic, so the
/// poison flag carries no information here.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
