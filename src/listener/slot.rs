use std::sync::{Arc, Mutex, MutexGuard};

use super::protocol::Snapshot;

/// A published snapshot tagged with its arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedSnapshot {
    pub generation: u64,
    pub snapshot: Arc<Snapshot>,
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    snapshot: Option<Arc<Snapshot>>,
}

/// Single-value hand-off between the listener worker and the render loop.
/// Each publish replaces the previous snapshot; readers only ever see the newest.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    state: Mutex<SlotState>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: Snapshot) -> u64 {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.snapshot = Some(Arc::new(snapshot));
        state.generation
    }

    pub fn latest(&self) -> Option<StampedSnapshot> {
        let state = self.lock();
        state.snapshot.as_ref().map(|snapshot| StampedSnapshot {
            generation: state.generation,
            snapshot: Arc::clone(snapshot),
        })
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
