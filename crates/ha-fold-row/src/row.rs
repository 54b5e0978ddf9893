//! The fold row element

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ha_core::SharedHass;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::context::HassSlot;
use crate::error::{FoldRowError, FoldRowResult};
use crate::host::{FoldHost, RowHandle, RowList};
use crate::pipeline::{HeadBinding, RowPipeline};
use crate::resolver::FoldRowConfig;
use crate::toggle::{FoldPhase, ToggleState};
use crate::lock;

/// Signals delivered to the fold row by its host
#[derive(Debug, Clone, PartialEq)]
pub enum FoldEvent {
    /// `action` emitted by the action handler bound to the head
    Action,
    /// `ll-custom` bubbling up from a row, with its detail
    LlCustom(Value),
    /// `transitionend` on the fold container
    TransitionEnd,
}

/// Outcome of mounting the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inside a card
    InCard,
    /// Not inside any card; `warned` tells whether an advisory went out
    Detached { warned: bool },
}

/// A collapsible row: a head plus child rows shown on demand
pub struct FoldEntityRow {
    pub(crate) host: FoldHost,
    context: Arc<HassSlot>,
    toggle: Arc<Mutex<ToggleState>>,
    pipeline: Mutex<Option<Arc<RowPipeline>>>,
    advised: AtomicBool,
}

impl FoldEntityRow {
    pub fn new(host: FoldHost) -> Self {
        Self {
            host,
            context: Arc::new(HassSlot::new()),
            toggle: Arc::new(Mutex::new(ToggleState::default())),
            pipeline: Mutex::new(None),
            advised: AtomicBool::new(false),
        }
    }

    /// Apply a new card configuration
    ///
    /// Starts creating the head right away, and the child rows too when the
    /// row starts open. Everything created for a previous configuration is
    /// dropped. On error the row is left unconfigured.
    #[instrument(skip_all)]
    pub fn set_config(&self, raw: &Value) -> FoldRowResult<()> {
        let config = match FoldRowConfig::from_value(raw) {
            Ok(config) => Arc::new(config),
            Err(err) => {
                error!(%err, "Invalid fold row configuration");
                *lock(&self.pipeline) = None;
                return Err(err.into());
            }
        };

        debug!(
            open = config.open,
            clickable = config.clickable(),
            "Configuring fold row"
        );
        *lock(&self.toggle) = ToggleState::initial(config.open);

        let pipeline = Arc::new(RowPipeline::new(
            config.clone(),
            self.host.clone(),
            self.context.clone(),
            self.toggle.clone(),
        ));
        if config.open {
            pipeline.preload_rows();
        }
        *lock(&self.pipeline) = Some(pipeline);

        Ok(())
    }

    /// The active configuration
    pub fn config(&self) -> Option<Arc<FoldRowConfig>> {
        lock(&self.pipeline).as_ref().map(|p| p.config().clone())
    }

    /// The head row, waiting for it if necessary
    pub async fn head(&self) -> FoldRowResult<RowHandle> {
        Ok(self.pipeline()?.head().await)
    }

    /// How the head forwards gestures; `None` for non-clickable heads
    pub fn head_binding(&self) -> Option<HeadBinding> {
        lock(&self.pipeline).as_ref().and_then(|p| p.head_binding())
    }

    /// The child rows, creating them on first use
    pub async fn load_rows(&self) -> FoldRowResult<RowList> {
        self.pipeline()?.load_rows().await
    }

    /// The child rows if they exist yet
    pub fn rows(&self) -> Option<RowList> {
        lock(&self.pipeline).as_ref().and_then(|p| p.cached_rows())
    }

    /// Receive a new `hass` snapshot
    ///
    /// Stores it for rows created later, unblocks child resolution waiting
    /// on it, and pushes it onto every row created so far.
    pub async fn set_hass(&self, hass: SharedHass) {
        if self.context.set(hass.clone()) {
            debug!("hass arrived for pending child rows");
        }

        let pipeline = lock(&self.pipeline).clone();
        if let Some(pipeline) = pipeline {
            pipeline.propagate(hass).await;
        }
    }

    /// The last `hass` received
    pub fn hass(&self) -> Option<SharedHass> {
        self.context.current()
    }

    /// Dispatch a host signal
    ///
    /// Returns whether the signal was consumed.
    pub async fn handle_event(&self, event: FoldEvent) -> FoldRowResult<bool> {
        match event {
            FoldEvent::Action if self.head_binding() == Some(HeadBinding::ActionHandler) => {
                self.toggle().await?;
                Ok(true)
            }
            FoldEvent::LlCustom(detail)
                if detail.get("fold_row").and_then(Value::as_bool) == Some(true) =>
            {
                self.toggle().await?;
                Ok(true)
            }
            FoldEvent::TransitionEnd => {
                self.transition_end();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Row attached to the page
    ///
    /// A row outside any card gets one advisory per mount unless muted.
    pub async fn connected(&self) -> Placement {
        if self.host.parent.find_parent_card().await.is_some() {
            return Placement::InCard;
        }

        let muted = self.config().map(|c| c.mute).unwrap_or(false);
        if muted || self.advised.swap(true, Ordering::SeqCst) {
            return Placement::Detached { warned: false };
        }

        warn!("fold-entity-row should be placed inside an entities card (set `mute: true` to hide this)");
        Placement::Detached { warned: true }
    }

    /// Row detached from the page
    pub fn disconnected(&self) {
        self.advised.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.toggle_state().open
    }

    pub fn phase(&self) -> FoldPhase {
        self.toggle_state().phase()
    }

    /// Snapshot of the toggle state
    pub fn toggle_state(&self) -> ToggleState {
        *lock(&self.toggle)
    }

    pub(crate) fn update_toggle(&self, f: impl FnOnce(&mut ToggleState)) {
        f(&mut lock(&self.toggle));
    }

    pub(crate) fn pipeline(&self) -> FoldRowResult<Arc<RowPipeline>> {
        lock(&self.pipeline)
            .clone()
            .ok_or(FoldRowError::NotConfigured)
    }
}
