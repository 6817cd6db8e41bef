//! The single channel that tells every observer about lock state changes.

use tokio::sync::broadcast;

use crate::unlock::UnlockState;

const CHANNEL_CAPACITY: usize = 16;

/// Publish side of the lock state channel. Cheap to clone.
#[derive(Clone)]
pub struct StateEvents {
    tx: broadcast::Sender<UnlockState>,
}

impl Default for StateEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl StateEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Having no subscribers is fine; the event is simply dropped.
    pub fn publish(&self, state: UnlockState) {
        let _ = self.tx.send(state);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UnlockState> {
        self.tx.subscribe()
    }
}
