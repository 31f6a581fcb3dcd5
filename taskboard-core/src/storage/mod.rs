pub mod coerce;
pub mod local;

use std::sync::{Mutex, PoisonError};

use crate::types::AppState;

pub use coerce::coerce_snapshot;

/// Persistence seam for board snapshots.
///
/// The board is stored as one opaque JSON blob. Implementations: LocalStore
/// (a file on disk) and MemoryStore (in-process).
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot. `Ok(None)` means nothing was saved yet.
    fn load(&self) -> Result<Option<AppState>, StorageError>;

    /// Persist a snapshot, replacing whatever was stored before.
    fn save(&self, state: &AppState) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Load the stored board, falling back to the default three-column board
/// when nothing is stored or the stored blob cannot be read.
pub fn load_or_default(store: &dyn SnapshotStore) -> AppState {
    match store.load() {
        Ok(Some(state)) => state,
        Ok(None) => {
            log::info!(target: "taskboard.storage", "No saved board, starting with defaults");
            AppState::default()
        }
        Err(e) => {
            log::warn!(
                target: "taskboard.storage",
                "Failed to load board, starting with defaults: {}",
                e
            );
            AppState::default()
        }
    }
}

/// Parse a stored blob into a snapshot, coercing malformed records.
pub fn parse_snapshot(content: &str) -> Result<AppState, StorageError> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(StorageError::Parse)?;
    Ok(coerce_snapshot(&value))
}

pub fn serialize_snapshot(state: &AppState) -> Result<String, StorageError> {
    serde_json::to_string_pretty(state).map_err(StorageError::Serialize)
}

/// Keeps the serialized blob in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob, as if it had been saved earlier.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
        }
    }

    pub fn content(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<AppState>, StorageError> {
        self.content()
            .map(|content| parse_snapshot(&content))
            .transpose()
    }

    fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let content = serialize_snapshot(state)?;
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
        Ok(())
    }
}
