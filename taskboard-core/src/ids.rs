//! Id generation for new columns and tasks.
//!
//! The engine only needs ids to be unique and stable; callers that already
//! own an id scheme can use the `*_with_id` entry points instead.
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate `"{prefix}-xxxxxxxxxxxx"`.
/// A process-wide counter plus a nanosecond timestamp, hashed with SHA-256
/// so the suffix is uniformly distributed.
pub fn generate_id(prefix: &str) -> String {
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}-{}", prefix, hex::encode(&hash[..6]))
}

pub fn column_id() -> String {
    generate_id("col")
}

pub fn task_id() -> String {
    generate_id("task")
}
