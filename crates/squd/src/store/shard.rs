//! A single lock-protected partition of the command store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::protocol::Command;

/// In-flight command plus its ageing counters.
#[derive(Debug)]
struct PendingEntry {
    command: Command,
    wait_index: u64,
    wait_limit: u64,
}

impl PendingEntry {
    fn expired(&self) -> bool {
        self.wait_index > self.wait_limit
    }
}

/// Map from task id to pending entry guarded by one read-write lock.
///
/// Entries hold plain data, so a poisoned lock still guards a consistent map
/// and is recovered rather than propagated.
#[derive(Debug, Default)]
pub(crate) struct Shard {
    entries: RwLock<HashMap<String, PendingEntry>>,
}

impl Shard {
    /// Inserts or replaces the entry for `key` with a fresh age.
    pub(crate) fn insert(&self, key: &str, command: Command, wait_limit: u64) {
        let entry = PendingEntry {
            command,
            wait_index: 0,
            wait_limit,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), entry);
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Ages every entry by one tick and removes the ones past their limit.
    ///
    /// Ageing, selection and removal take the lock separately, so a `free`
    /// arriving in between wins and the entry is not returned.
    pub(crate) fn sweep(&self) -> Vec<(String, Command)> {
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            for entry in entries.values_mut() {
                entry.wait_index += 1;
            }
        }

        let expired: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| entry.expired())
            .map(|(key, _)| key.clone())
            .collect();
        if expired.is_empty() {
            return Vec::new();
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        expired
            .into_iter()
            .filter_map(|key| entries.remove(&key).map(|entry| (key, entry.command)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_expires_once_index_passes_limit() {
        let shard = Shard::default();
        shard.insert("abcde", Command::new(1, "job"), 2);

        assert!(shard.sweep().is_empty());
        assert!(shard.sweep().is_empty());
        let expired = shard.sweep();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, "abcde");
        assert_eq!(expired[0].1.method, "job");
        assert_eq!(shard.len(), 0);
    }

    #[test]
    fn zero_limit_expires_on_first_tick() {
        let shard = Shard::default();
        shard.insert("abcde", Command::new(1, "job"), 0);
        assert_eq!(shard.sweep().len(), 1);
    }

    #[test]
    fn reinsert_resets_age() {
        let shard = Shard::default();
        shard.insert("abcde", Command::new(1, "job"), 1);
        assert!(shard.sweep().is_empty());
        shard.insert("abcde", Command::new(2, "job"), 1);
        assert!(shard.sweep().is_empty());
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn removed_entries_are_not_swept() {
        let shard = Shard::default();
        shard.insert("abcde", Command::new(1, "job"), 0);
        assert!(shard.remove("abcde"));
        assert!(!shard.remove("abcde"));
        assert!(shard.sweep().is_empty());
    }
}
