//! In-process host
//!
//! A complete host without a browser: rows are plain records of what was
//! done to them, layout is a fixed content height, and every call into the
//! host is recorded. Used by the preview tool and by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ha_config::RowConfig;
use ha_core::SharedHass;
use serde_json::Value;

use crate::host::{
    ActionHandler, ActionHandlerOptions, FoldHost, FoldLayout, Height, NestedElement, Overflow,
    ParentCard, ParentCardLookup, RowElement, RowFactory, RowHandle, RowStyler, StyleRequest,
    SubtreeQuery,
};
use crate::lock;

/// A row element that only records what happened to it
#[derive(Debug)]
pub struct MemoryRow {
    config: RowConfig,
    attributes: Mutex<HashMap<String, String>>,
    hass: Mutex<Option<SharedHass>>,
    hass_updates: AtomicUsize,
    tap_action: Mutex<Option<Value>>,
}

impl MemoryRow {
    fn new(config: RowConfig) -> Self {
        Self {
            config,
            attributes: Mutex::new(HashMap::new()),
            hass: Mutex::new(None),
            hass_updates: AtomicUsize::new(0),
            tap_action: Mutex::new(None),
        }
    }

    /// Number of `set_hass` calls received
    pub fn hass_updates(&self) -> usize {
        self.hass_updates.load(Ordering::SeqCst)
    }

    /// The last `hass` received
    pub fn hass(&self) -> Option<SharedHass> {
        lock(&self.hass).clone()
    }

    /// The delegated tap action, if any
    pub fn tap_action(&self) -> Option<Value> {
        lock(&self.tap_action).clone()
    }
}

impl RowElement for MemoryRow {
    fn set_hass(&self, hass: SharedHass) {
        *lock(&self.hass) = Some(hass);
        self.hass_updates.fetch_add(1, Ordering::SeqCst);
    }

    fn set_attribute(&self, name: &str, value: &str) {
        lock(&self.attributes).insert(name.to_string(), value.to_string());
    }

    fn attribute(&self, name: &str) -> Option<String> {
        lock(&self.attributes).get(name).cloned()
    }

    fn delegate_tap_action(&self, action: Value) {
        *lock(&self.tap_action) = Some(action);
    }

    fn config(&self) -> RowConfig {
        self.config.clone()
    }
}

#[derive(Default)]
struct MemoryState {
    rows: Mutex<Vec<Arc<MemoryRow>>>,
    style_requests: Mutex<Vec<StyleRequest>>,
    completed: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    queries: Mutex<Vec<String>>,
    nested_target: AtomicBool,
    action_bindings: AtomicUsize,
    parent: Mutex<Option<ParentCard>>,
    content_height: Mutex<f64>,
    height: Mutex<Height>,
    overflow: Mutex<Overflow>,
}

/// Recording host implementing every collaborator trait
#[derive(Clone)]
pub struct MemoryHost {
    state: Arc<MemoryState>,
}

impl MemoryHost {
    /// A host placed inside an (empty-config) card, with no content height
    pub fn new() -> Self {
        let host = Self {
            state: Arc::new(MemoryState::default()),
        };
        host.set_parent(Some(ParentCard::default()));
        host
    }

    /// Collaborator bundle for a fold row
    pub fn fold_host(&self) -> FoldHost {
        FoldHost {
            factory: self.state.clone(),
            styler: self.state.clone(),
            query: self.state.clone(),
            actions: self.state.clone(),
            parent: self.state.clone(),
            layout: self.state.clone(),
        }
    }

    /// Replace the enclosing card (`None` for a row outside any card)
    pub fn set_parent(&self, parent: Option<ParentCard>) {
        *lock(&self.state.parent) = parent;
    }

    /// Natural content height reported by the layout, in px
    pub fn set_content_height(&self, px: f64) {
        *lock(&self.state.content_height) = px;
    }

    /// Whether the head contains a nested element owning the tap gesture
    pub fn set_nested_action_target(&self, present: bool) {
        self.state.nested_target.store(present, Ordering::SeqCst);
    }

    /// Delay styling (and so completion) of rows for `entity_id`
    pub fn set_delay(&self, entity_id: &str, delay: Duration) {
        lock(&self.state.delays).insert(entity_id.to_string(), delay);
    }

    /// Number of elements the factory created
    pub fn create_calls(&self) -> usize {
        lock(&self.state.rows).len()
    }

    /// Every element created for `entity_id`, in creation order
    pub fn created(&self, entity_id: &str) -> Vec<Arc<MemoryRow>> {
        lock(&self.state.rows)
            .iter()
            .filter(|row| row.config.entity() == Some(entity_id))
            .cloned()
            .collect()
    }

    /// Every element created, in creation order
    pub fn all_created(&self) -> Vec<Arc<MemoryRow>> {
        lock(&self.state.rows).clone()
    }

    /// Entities in the order their rows finished styling
    pub fn completion_order(&self) -> Vec<String> {
        lock(&self.state.completed).clone()
    }

    pub fn style_requests(&self) -> Vec<StyleRequest> {
        lock(&self.state.style_requests).clone()
    }

    pub fn queries(&self) -> Vec<String> {
        lock(&self.state.queries).clone()
    }

    pub fn action_bindings(&self) -> usize {
        self.state.action_bindings.load(Ordering::SeqCst)
    }

    /// Current explicit container height
    pub fn height(&self) -> Height {
        *lock(&self.state.height)
    }

    /// Current container overflow
    pub fn overflow(&self) -> Overflow {
        *lock(&self.state.overflow)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowFactory for MemoryState {
    async fn ready(&self) {}

    fn create_row_element(&self, config: &RowConfig) -> RowHandle {
        let row = Arc::new(MemoryRow::new(config.clone()));
        lock(&self.rows).push(row.clone());
        row
    }
}

#[async_trait]
impl RowStyler for MemoryState {
    async fn ready(&self) {}

    async fn apply(&self, request: StyleRequest) {
        let config = request.element.config();
        let entity = config.entity().unwrap_or_default().to_string();
        let delay = lock(&self.delays).get(&entity).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.style_requests).push(request);
        lock(&self.completed).push(entity);
    }
}

#[async_trait]
impl SubtreeQuery for MemoryState {
    async fn select_tree(&self, _root: &RowHandle, path: &str) -> Option<NestedElement> {
        lock(&self.queries).push(path.to_string());
        self.nested_target
            .load(Ordering::SeqCst)
            .then(|| NestedElement {
                tag: "div".to_string(),
            })
    }
}

impl ActionHandler for MemoryState {
    fn bind(&self, _element: &RowHandle, _options: ActionHandlerOptions) {
        self.action_bindings.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParentCardLookup for MemoryState {
    async fn find_parent_card(&self) -> Option<ParentCard> {
        lock(&self.parent).clone()
    }
}

impl FoldLayout for MemoryState {
    fn scroll_height(&self) -> f64 {
        *lock(&self.content_height)
    }

    fn set_height(&self, height: Height) {
        *lock(&self.height) = height;
    }

    fn set_overflow(&self, overflow: Overflow) {
        *lock(&self.overflow) = overflow;
    }
}
