/// Local filesystem snapshot store.
///
/// Keeps the whole board in one JSON file with:
/// - Atomic writes (write to .tmp, fsync, rename)
/// - SHA-256 content hashing to skip rewriting unchanged snapshots
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

use super::{parse_snapshot, serialize_snapshot, SnapshotStore, StorageError};
use crate::types::AppState;

pub struct LocalStore {
    path: PathBuf,
    /// SHA-256 of the last content read or written
    last_hash: Mutex<Option<String>>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_hash: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.replace("\r\n", "\n").as_bytes());
        hex::encode(hasher.finalize())
    }

    fn remember(&self, hash: String) {
        *self.last_hash.lock().unwrap_or_else(PoisonError::into_inner) = Some(hash);
    }

    fn is_unchanged(&self, hash: &str) -> bool {
        self.last_hash
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(hash)
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = path.with_extension("taskboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl SnapshotStore for LocalStore {
    fn load(&self) -> Result<Option<AppState>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let state = parse_snapshot(&content)?;
        self.remember(Self::content_hash(&content));
        log::info!(
            "[taskboard.storage.load] Loaded {} column(s), {} task(s) from {}",
            state.columns().len(),
            state.tasks().len(),
            self.path.display()
        );
        Ok(Some(state))
    }

    fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let content = serialize_snapshot(state)?;
        let hash = Self::content_hash(&content);
        if self.is_unchanged(&hash) {
            log::debug!(
                "[taskboard.storage.save] Snapshot unchanged, skipping write to {}",
                self.path.display()
            );
            return Ok(());
        }

        Self::atomic_write(&self.path, &content)?;
        self.remember(hash);
        log::debug!(
            "[taskboard.storage.save] Wrote {} bytes to {}",
            content.len(),
            self.path.display()
        );
        Ok(())
    }
}
