//! The live board: current snapshot plus the store it is saved to.
use crate::storage::{load_or_default, SnapshotStore};
use crate::types::AppState;

pub struct BoardSession<S: SnapshotStore> {
    store: S,
    state: AppState,
}

impl<S: SnapshotStore> BoardSession<S> {
    /// Open the board saved in `store`, or the default board.
    pub fn open(store: S) -> Self {
        let state = load_or_default(&store);
        Self { store, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one engine operation against the current snapshot.
    ///
    /// Returns whether the board changed. Changed snapshots are saved; a
    /// failed save is logged and the in-memory board keeps the change.
    pub fn apply<F>(&mut self, op: F) -> bool
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let next = op(&self.state);
        if next.ptr_eq(&self.state) {
            log::debug!(target: "taskboard.session", "Operation left the board unchanged");
            return false;
        }
        self.state = next;
        if let Err(e) = self.store.save(&self.state) {
            log::warn!(target: "taskboard.session", "Failed to save board: {}", e);
        }
        true
    }

    pub fn into_state(self) -> AppState {
        self.state
    }
}
