//! Row creation through the host factory

use std::sync::Arc;

use ha_config::RowConfig;
use ha_core::SharedHass;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::context::HassSlot;
use crate::host::{FoldHost, ParentCard, RowHandle, StyleRequest, ROW_STYLE_SLOT};

/// Config key holding per-row style overrides
const CARD_MOD_KEY: &str = "card_mod";

/// Wraps the host factory with fold-row defaults, styling and `hass`
#[derive(Clone)]
pub struct RowFactoryAdapter {
    host: FoldHost,
    context: Arc<HassSlot>,
    state_color: Option<bool>,
    group_config: Map<String, Value>,
}

impl RowFactoryAdapter {
    pub fn new(
        host: FoldHost,
        context: Arc<HassSlot>,
        state_color: Option<bool>,
        group_config: Map<String, Value>,
    ) -> Self {
        Self {
            host,
            context,
            state_color,
            group_config,
        }
    }

    /// Create one row element
    ///
    /// Never caches; every call produces a new element.
    pub async fn create_row(&self, descriptor: &RowConfig, is_header: bool) -> RowHandle {
        self.create_row_with_hass(descriptor, is_header).await.0
    }

    /// Create one row element, also returning the `hass` it was given
    #[instrument(skip(self, descriptor), fields(entity = descriptor.entity().unwrap_or_default()))]
    pub(crate) async fn create_row_with_hass(
        &self,
        descriptor: &RowConfig,
        is_header: bool,
    ) -> (RowHandle, Option<SharedHass>) {
        self.host.factory.ready().await;

        let parent = self.host.parent.find_parent_card().await;
        let state_color = resolve_state_color(self.state_color, parent.as_ref());
        let config = self.effective_config(descriptor, is_header, state_color);

        let element = self.host.factory.create_row_element(&config);
        debug!(is_header, "Created row element");

        self.host.styler.ready().await;
        let card_mod = config.get(CARD_MOD_KEY);
        let request = StyleRequest {
            element: element.clone(),
            slot: ROW_STYLE_SLOT,
            style: card_mod.and_then(|c| c.get("style")).cloned(),
            dynamic_class: card_mod
                .and_then(|c| c.get("class"))
                .and_then(Value::as_str)
                .map(str::to_string),
            config,
        };
        self.host.styler.apply(request).await;

        let hass = self.context.current();
        if let Some(hass) = &hass {
            element.set_hass(hass.clone());
        }

        (element, hass)
    }

    /// Layer `{state_color}`, group defaults (children only) and the row
    pub fn effective_config(
        &self,
        descriptor: &RowConfig,
        is_header: bool,
        state_color: Option<bool>,
    ) -> RowConfig {
        let mut base = Map::new();
        if let Some(state_color) = state_color {
            base.insert("state_color".to_string(), Value::Bool(state_color));
        }

        let empty = Map::new();
        let group = if is_header { &empty } else { &self.group_config };
        RowConfig::layered([&base, group, descriptor.as_map()])
    }
}

/// First defined of the row's own flag and the parent card's two spellings
pub fn resolve_state_color(own: Option<bool>, parent: Option<&ParentCard>) -> Option<bool> {
    let from_parent = |key: &str| {
        parent
            .and_then(|p| p.config.get(key))
            .and_then(Value::as_bool)
    };

    own.or_else(|| from_parent("state_color"))
        .or_else(|| from_parent("show_state_color"))
}
