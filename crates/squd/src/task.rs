//! Task identifier generation.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Produces unique, lowercase hex task identifiers.
///
/// Identifiers are SHA-256 digests of a seed built from a per-generator
/// counter, the wall clock and the process id, so every character is a hex
/// digit and the store's shard index is spread evenly.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    counter: AtomicU64,
}

impl TaskIdGenerator {
    /// Builds a generator with its counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh 64-character identifier.
    pub fn generate(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(sequence.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update(process::id().to_le_bytes());
        hex::encode(hasher.finalize())
    }
}
