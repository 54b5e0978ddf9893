//! Lazily materialized head and child rows
//!
//! One pipeline lives for exactly one configuration. The head is created as
//! soon as the pipeline exists; child rows are created as one batch the
//! first time anything asks for them. Both are cached as shared futures, so
//! concurrent callers share a single load and later callers get the cached
//! handles back.

use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use ha_core::SharedHass;
use serde_json::json;
use tracing::{debug, error, instrument, trace};

use crate::context::HassSlot;
use crate::error::FoldRowResult;
use crate::factory::RowFactoryAdapter;
use crate::host::{ActionHandlerOptions, FoldHost, RowElement, RowHandle, RowList};
use crate::lock;
use crate::resolver::FoldRowConfig;
use crate::toggle::ToggleState;

/// Path to the element inside a generic entity row that owns its tap gesture
pub const HEAD_ACTION_TARGET: &str = "$ hui-generic-entity-row $ .info";

type SharedHead = Shared<BoxFuture<'static, RowHandle>>;
type SharedRows = Shared<BoxFuture<'static, FoldRowResult<RowList>>>;

/// How a clickable head forwards its gesture to the fold row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadBinding {
    /// The head's nested row fires an `ll-custom` event with `fold_row: true`
    Delegated,
    /// A generic action handler is bound to the head; it emits `action`
    ActionHandler,
}

pub struct RowPipeline {
    config: Arc<FoldRowConfig>,
    adapter: RowFactoryAdapter,
    context: Arc<HassSlot>,
    head: SharedHead,
    head_binding: Arc<Mutex<Option<HeadBinding>>>,
    rows: Mutex<Option<SharedRows>>,
}

impl RowPipeline {
    /// Create the pipeline for one configuration and start its head
    pub fn new(
        config: Arc<FoldRowConfig>,
        host: FoldHost,
        context: Arc<HassSlot>,
        toggle: Arc<Mutex<ToggleState>>,
    ) -> Self {
        let adapter = RowFactoryAdapter::new(
            host.clone(),
            context.clone(),
            config.state_color,
            config.group_config.clone(),
        );
        let head_binding = Arc::new(Mutex::new(None));

        let head = load_head(
            config.clone(),
            adapter.clone(),
            host,
            head_binding.clone(),
            toggle,
        )
        .boxed()
        .shared();
        drive(head.clone());

        Self {
            config,
            adapter,
            context,
            head,
            head_binding,
            rows: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Arc<FoldRowConfig> {
        &self.config
    }

    /// The head row, once created
    pub async fn head(&self) -> RowHandle {
        self.head.clone().await
    }

    /// The head row if it has already been created
    pub fn peek_head(&self) -> Option<RowHandle> {
        self.head.peek().cloned()
    }

    /// How the head forwards gestures, once it is set up
    pub fn head_binding(&self) -> Option<HeadBinding> {
        *lock(&self.head_binding)
    }

    /// Start loading child rows without waiting for them
    pub fn preload_rows(&self) {
        drive(self.rows_future());
    }

    /// The child rows, creating them on first use
    pub async fn load_rows(&self) -> FoldRowResult<RowList> {
        self.rows_future().await
    }

    /// The child rows if they have already been created
    pub fn cached_rows(&self) -> Option<RowList> {
        lock(&self.rows)
            .as_ref()
            .and_then(|rows| rows.peek())
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// Push a new `hass` onto every row created so far
    pub async fn propagate(&self, hass: SharedHass) {
        if let Some(rows) = self.cached_rows() {
            trace!(count = rows.len(), "Updating hass on child rows");
            for row in rows.iter() {
                row.set_hass(hass.clone());
            }
        }

        self.head().await.set_hass(hass);
    }

    fn rows_future(&self) -> SharedRows {
        lock(&self.rows)
            .get_or_insert_with(|| {
                load_rows(
                    self.config.clone(),
                    self.adapter.clone(),
                    self.context.clone(),
                )
                .boxed()
                .shared()
            })
            .clone()
    }
}

#[instrument(skip_all, fields(head = config.head.entity().unwrap_or_default()))]
async fn load_head(
    config: Arc<FoldRowConfig>,
    adapter: RowFactoryAdapter,
    host: FoldHost,
    binding: Arc<Mutex<Option<HeadBinding>>>,
    toggle: Arc<Mutex<ToggleState>>,
) -> RowHandle {
    let head = adapter.create_row(&config.head, true).await;

    if config.clickable() {
        let kind = match host.query.select_tree(&head, HEAD_ACTION_TARGET).await {
            Some(_) => {
                head.delegate_tap_action(json!({
                    "action": "fire-dom-event",
                    "fold_row": true,
                }));
                HeadBinding::Delegated
            }
            None => {
                host.actions.bind(&head, ActionHandlerOptions::default());
                HeadBinding::ActionHandler
            }
        };
        debug!(binding = ?kind, "Head toggles the fold");
        *lock(&binding) = Some(kind);

        head.set_attribute("tabindex", "0");
        head.set_attribute("role", "switch");
        let open = lock(&toggle).open;
        sync_head_aria(&*head, open);
    }

    head
}

#[instrument(skip_all)]
async fn load_rows(
    config: Arc<FoldRowConfig>,
    adapter: RowFactoryAdapter,
    context: Arc<HassSlot>,
) -> FoldRowResult<RowList> {
    let result = create_rows(&config, &adapter, &context).await;
    if let Err(err) = &result {
        error!(%err, "Failed to load fold rows");
    }
    result
}

async fn create_rows(
    config: &FoldRowConfig,
    adapter: &RowFactoryAdapter,
    context: &HassSlot,
) -> FoldRowResult<RowList> {
    let source = config.item_source();
    let hass = if source.needs_hass() {
        Some(context.wait().await?)
    } else {
        None
    };
    let descriptors = source.resolve(hass.as_deref())?;

    // Creation may finish in any order; join_all keeps list order
    debug!(count = descriptors.len(), "Creating child rows");
    let created = join_all(
        descriptors
            .iter()
            .map(|row| adapter.create_row_with_hass(row, false)),
    )
    .await;

    // Propagation skips rows until the whole batch is cached, so rows that
    // finished before the latest hass arrived need it pushed here
    let latest = context.current();
    let rows: Vec<RowHandle> = created
        .into_iter()
        .map(|(row, given)| {
            if let Some(hass) = &latest {
                if !given.is_some_and(|given| Arc::ptr_eq(&given, hass)) {
                    trace!("Catching up child row on hass");
                    row.set_hass(hass.clone());
                }
            }
            row
        })
        .collect();
    Ok(Arc::new(rows))
}

/// Accessible name of the toggle switch, on the head or the affordance
pub const TOGGLE_LABEL: &str = "Toggle fold";

/// Reflect the open state on a clickable head
pub fn sync_head_aria(head: &dyn RowElement, open: bool) {
    head.set_attribute("aria-checked", if open { "true" } else { "false" });
    head.set_attribute("aria-label", TOGGLE_LABEL);
}

/// Poll a shared load in the background when a runtime is available
///
/// Without a runtime the load still runs, just on first await.
fn drive<T>(load: Shared<BoxFuture<'static, T>>)
where
    T: Clone + Send + Sync + 'static,
{
    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        runtime.spawn(async move {
            let _ = load.await;
        });
    }
}
