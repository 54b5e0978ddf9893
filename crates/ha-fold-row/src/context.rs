//! Late-arriving `hass` and the one-shot wait for it

use std::sync::{Mutex, MutexGuard};

use futures::future::{FutureExt, Shared};
use ha_core::SharedHass;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{FoldRowError, FoldRowResult};
use crate::lock;

type PendingHass = Shared<oneshot::Receiver<SharedHass>>;

/// Single-resolution waiter for the first `hass`
///
/// Created only when something needs `hass` before it has arrived,
/// resolved exactly once, then discarded.
pub struct ContextWaiter {
    tx: oneshot::Sender<SharedHass>,
    pending: PendingHass,
}

impl ContextWaiter {
    fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx,
            pending: rx.shared(),
        }
    }

    fn resolve(self, hass: SharedHass) {
        // Every awaiter holds a clone of the receiver, so this only fails
        // when nobody is waiting anymore.
        let _ = self.tx.send(hass);
    }
}

#[derive(Default)]
struct SlotState {
    hass: Option<SharedHass>,
    waiter: Option<ContextWaiter>,
}

/// Holds the current `hass` snapshot of a fold row
#[derive(Default)]
pub struct HassSlot {
    state: Mutex<SlotState>,
}

impl HassSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if any
    pub fn current(&self) -> Option<SharedHass> {
        self.lock().hass.clone()
    }

    /// Whether a waiter is parked on this slot
    pub fn is_waiting(&self) -> bool {
        self.lock().waiter.is_some()
    }

    /// Store a new snapshot
    ///
    /// Returns true when this resolved a pending waiter.
    pub fn set(&self, hass: SharedHass) -> bool {
        let waiter = {
            let mut state = self.lock();
            state.hass = Some(hass.clone());
            state.waiter.take()
        };

        match waiter {
            Some(waiter) => {
                trace!("Resolving pending hass waiter");
                waiter.resolve(hass);
                true
            }
            None => false,
        }
    }

    /// The current snapshot, or the first one to arrive
    pub async fn wait(&self) -> FoldRowResult<SharedHass> {
        let pending = {
            let mut state = self.lock();
            if let Some(hass) = &state.hass {
                return Ok(hass.clone());
            }
            state
                .waiter
                .get_or_insert_with(ContextWaiter::new)
                .pending
                .clone()
        };

        trace!("Waiting for hass");
        pending.await.map_err(|_| FoldRowError::ContextDropped)
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        lock(&self.state)
    }
}
