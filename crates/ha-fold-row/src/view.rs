//! Declarative output of the fold row

use crate::host::{Height, Overflow, RowHandle};
use crate::pipeline::TOGGLE_LABEL;
use crate::row::FoldEntityRow;

/// Toggle affordance rendered next to a non-clickable head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleAffordance {
    pub role: &'static str,
    pub aria_checked: bool,
    pub aria_label: &'static str,
    pub icon: &'static str,
    /// Chevron rotated to point down
    pub flipped: bool,
}

/// The collapsible region
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerView {
    pub aria_expanded: bool,
    pub aria_hidden: bool,
    pub padding_px: f64,
    pub height: Height,
    pub overflow: Overflow,
}

/// One render of the fold row
#[derive(Debug, Clone)]
pub struct FoldView {
    /// The head row, once created
    pub head: Option<RowHandle>,
    pub toggle: Option<ToggleAffordance>,
    pub container: ContainerView,
    /// Mounted child rows, each rendered in its own wrapper
    pub rows: Vec<RowHandle>,
}

const TOGGLE_ICON: &str = "mdi:chevron-down";

impl FoldEntityRow {
    /// Render the current state
    ///
    /// `None` until a configuration has been applied.
    pub fn render(&self) -> Option<FoldView> {
        let pipeline = self.pipeline().ok()?;
        let config = pipeline.config();
        let state = self.toggle_state();

        let toggle = (!config.clickable()).then(|| ToggleAffordance {
            role: "switch",
            aria_checked: state.open,
            aria_label: TOGGLE_LABEL,
            icon: TOGGLE_ICON,
            flipped: state.open,
        });

        let rows = if state.show_content {
            pipeline
                .cached_rows()
                .map(|rows| rows.iter().cloned().collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Some(FoldView {
            head: pipeline.peek_head(),
            toggle,
            container: ContainerView {
                aria_expanded: state.open,
                aria_hidden: !state.open,
                padding_px: config.padding,
                height: state.height,
                overflow: state.overflow,
            },
            rows,
        })
    }
}
