//! Open/closed state and the height animation around it
//!
//! ```text
//! Closed --toggle--> Opening --transitionend--> Open
//!   ^                                            |
//!   +---transitionend--- Closing <---toggle------+
//! ```
//!
//! Only `open` and `show_content` are real state. `Opening`/`Closing` are
//! the stretch between a toggle that started a height transition and the
//! container's `transitionend`.

use tracing::{debug, trace};

use crate::error::FoldRowResult;
use crate::host::{Height, Overflow};
use crate::pipeline::sync_head_aria;
use crate::row::FoldEntityRow;

/// Where the fold is in its open/close cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Toggle state of one fold row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleState {
    /// Source of truth for the rendered open state
    pub open: bool,
    /// Whether child rows are mounted; lags `open` while closing
    pub show_content: bool,
    /// Explicit container height
    pub height: Height,
    pub overflow: Overflow,
    /// A height transition is running
    pub animating: bool,
}

impl ToggleState {
    /// Resting state for a freshly configured row
    pub fn initial(open: bool) -> Self {
        Self {
            open,
            show_content: open,
            height: Height::Unset,
            overflow: resting_overflow(open),
            animating: false,
        }
    }

    pub fn phase(&self) -> FoldPhase {
        match (self.open, self.animating) {
            (false, false) => FoldPhase::Closed,
            (true, true) => FoldPhase::Opening,
            (true, false) => FoldPhase::Open,
            (false, true) => FoldPhase::Closing,
        }
    }
}

impl Default for ToggleState {
    fn default() -> Self {
        Self::initial(false)
    }
}

fn resting_overflow(open: bool) -> Overflow {
    if open {
        Overflow::Initial
    } else {
        Overflow::Hidden
    }
}

impl FoldEntityRow {
    /// Flip the fold open or closed
    ///
    /// Opening mounts and (on first use) creates the child rows before
    /// measuring. Calling this again mid-animation simply starts the
    /// opposite transition.
    pub async fn toggle(&self) -> FoldRowResult<()> {
        let pipeline = self.pipeline()?;
        let target = !self.toggle_state().open;
        debug!(open = target, "Toggling fold");

        self.set_overflow(Overflow::Hidden);

        if target {
            self.update_toggle(|state| state.show_content = true);
            if let Err(err) = pipeline.load_rows().await {
                // Nothing to show; fall back to the resting state of the
                // unchanged open flag
                let open = self.toggle_state().open;
                self.set_overflow(resting_overflow(open));
                self.update_toggle(|state| state.show_content = open);
                return Err(err);
            }
            // Let the mount land before measuring
            tokio::task::yield_now().await;
        }

        let measured = self.host.layout.scroll_height();
        let height = if measured > 0.0 {
            Height::Px(measured)
        } else {
            Height::Auto
        };
        self.set_height(height);
        self.update_toggle(|state| state.animating = measured > 0.0);

        if !target {
            // Start the collapse from the measured height, not from nothing
            tokio::task::yield_now().await;
            self.set_height(Height::Px(0.0));
        }

        self.update_toggle(|state| state.open = target);

        if pipeline.config().clickable() {
            let head = pipeline.head().await;
            sync_head_aria(&*head, target);
        }

        Ok(())
    }

    /// Container `transitionend`: settle into the resting state
    pub fn transition_end(&self) {
        let open = self.toggle_state().open;
        trace!(open, "Fold transition finished");

        self.set_height(Height::Unset);
        self.set_overflow(resting_overflow(open));
        self.update_toggle(|state| {
            state.show_content = open;
            state.animating = false;
        });
    }

    fn set_height(&self, height: Height) {
        self.host.layout.set_height(height);
        self.update_toggle(|state| state.height = height);
    }

    fn set_overflow(&self, overflow: Overflow) {
        self.host.layout.set_overflow(overflow);
        self.update_toggle(|state| state.overflow = overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let closed = ToggleState::initial(false);
        assert_eq!(closed.phase(), FoldPhase::Closed);
        assert!(!closed.show_content);
        assert_eq!(closed.overflow, Overflow::Hidden);

        let open = ToggleState::initial(true);
        assert_eq!(open.phase(), FoldPhase::Open);
        assert!(open.show_content);
        assert_eq!(open.overflow, Overflow::Initial);
        assert_eq!(open.height, Height::Unset);
    }

    #[test]
    fn test_phases() {
        let mut state = ToggleState::initial(false);
        state.animating = true;
        state.open = true;
        assert_eq!(state.phase(), FoldPhase::Opening);
        state.open = false;
        assert_eq!(state.phase(), FoldPhase::Closing);
    }
}
