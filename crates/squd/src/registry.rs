//! Reference-counted set of methods advertised by connected executers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Tracks how many executer connections serve each method.
///
/// A method is available while its count is positive. Counts never go below
/// zero and zeroed entries are kept.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    counts: RwLock<HashMap<String, usize>>,
}

impl MethodRegistry {
    /// Creates a registry with no advertised methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one advertiser of `name`.
    pub fn add(&self, name: &str) {
        let mut counts = self.counts.write().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(name.to_owned()).or_default();
        *count += 1;
        debug!(target: REGISTRY_TARGET, method = name, count = *count, "method added");
    }

    /// Removes one advertiser of `name`, never going below zero.
    pub fn delete(&self, name: &str) {
        let mut counts = self.counts.write().unwrap_or_else(PoisonError::into_inner);
        match counts.get_mut(name) {
            Some(count) if *count > 0 => {
                *count -= 1;
                debug!(target: REGISTRY_TARGET, method = name, count = *count, "method removed");
            }
            _ => warn!(
                target: REGISTRY_TARGET,
                method = name,
                "method removed more often than added"
            ),
        }
    }

    /// Returns true while at least one executer serves `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.count(name) > 0
    }

    /// Number of live advertisements of `name`.
    pub fn count(&self, name: &str) -> usize {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or_default()
    }
}
