//! Host collaborator interfaces
//!
//! The fold row does not build, style or lay out rows itself. Everything it
//! needs from the surrounding dashboard is expressed by the traits below;
//! the browser frontend provides the real implementations and
//! [`crate::memory`] provides in-process ones.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ha_config::RowConfig;
use ha_core::SharedHass;
use serde_json::{Map, Value};

/// An opaque row element created by the host factory
///
/// The fold row only ever touches the `hass` slot, attributes and the
/// nested tap action of a row; it never replaces the element.
pub trait RowElement: Send + Sync + fmt::Debug {
    /// Hand the element a new `hass` snapshot
    fn set_hass(&self, hass: SharedHass);

    /// Set an attribute on the element
    fn set_attribute(&self, name: &str, value: &str);

    /// Read an attribute back
    fn attribute(&self, name: &str) -> Option<String>;

    /// Replace the tap action of the element's own nested row config
    fn delegate_tap_action(&self, action: Value);

    /// The effective configuration the element was created with
    fn config(&self) -> RowConfig;
}

/// Shared handle to a row element; compared by identity
pub type RowHandle = Arc<dyn RowElement>;

/// Ordered list of child row handles
pub type RowList = Arc<Vec<RowHandle>>;

/// Whether two handles refer to the same element
pub fn same_element(a: &RowHandle, b: &RowHandle) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// The host's row factory (`createRowElement`)
#[async_trait]
pub trait RowFactory: Send + Sync {
    /// Resolves once the factory can be used
    async fn ready(&self);

    /// Create a row element for the given effective config
    fn create_row_element(&self, config: &RowConfig) -> RowHandle;
}

/// Parameters of a single styling request
#[derive(Debug, Clone)]
pub struct StyleRequest {
    pub element: RowHandle,
    /// Theming slot; rows always use [`ROW_STYLE_SLOT`]
    pub slot: &'static str,
    pub style: Option<Value>,
    pub config: RowConfig,
    pub dynamic_class: Option<String>,
}

/// Slot name passed with every row styling request
pub const ROW_STYLE_SLOT: &str = "row";

/// The row styling/theming hook
#[async_trait]
pub trait RowStyler: Send + Sync {
    /// Resolves once the themeable component is registered
    async fn ready(&self);

    /// Apply styles to a freshly created row
    async fn apply(&self, request: StyleRequest);
}

/// An element found inside an opaque row subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedElement {
    pub tag: String,
}

/// Subtree query helper able to cross shadow-root boundaries
#[async_trait]
pub trait SubtreeQuery: Send + Sync {
    /// Resolve `path` below `root`; `$` marks a shadow-root crossing
    async fn select_tree(&self, root: &RowHandle, path: &str) -> Option<NestedElement>;
}

/// Options for binding the generic action handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionHandlerOptions {
    pub has_hold: bool,
    pub has_double_click: bool,
}

/// Binds pointer/keyboard gestures to a single `action` signal
pub trait ActionHandler: Send + Sync {
    fn bind(&self, element: &RowHandle, options: ActionHandlerOptions);
}

/// The nearest enclosing card
#[derive(Debug, Clone, Default)]
pub struct ParentCard {
    pub config: Map<String, Value>,
}

/// Looks up the card this row is placed in
#[async_trait]
pub trait ParentCardLookup: Send + Sync {
    async fn find_parent_card(&self) -> Option<ParentCard>;
}

/// Explicit height of the fold container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Height {
    /// No explicit height; layout decides
    #[default]
    Unset,
    Auto,
    Px(f64),
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Auto => f.write_str("auto"),
            Self::Px(px) => write!(f, "{}px", px),
        }
    }
}

/// Overflow mode of the fold container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Hidden,
    Initial,
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hidden => "hidden",
            Self::Initial => "initial",
        })
    }
}

/// Measurement and style seam for the fold container
pub trait FoldLayout: Send + Sync {
    /// Natural height of the mounted content, in px
    fn scroll_height(&self) -> f64;

    fn set_height(&self, height: Height);

    fn set_overflow(&self, overflow: Overflow);
}

/// Everything the fold row needs from its host
#[derive(Clone)]
pub struct FoldHost {
    pub factory: Arc<dyn RowFactory>,
    pub styler: Arc<dyn RowStyler>,
    pub query: Arc<dyn SubtreeQuery>,
    pub actions: Arc<dyn ActionHandler>,
    pub parent: Arc<dyn ParentCardLookup>,
    pub layout: Arc<dyn FoldLayout>,
}
