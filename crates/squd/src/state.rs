//! Per-connection state changes with rollback on disconnect.

use std::sync::Arc;

use tracing::debug;

use crate::registry::MethodRegistry;

const STATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::state");

/// A mutation of shared broker state produced by handling one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// An executer advertised the methods it serves.
    MethodRegistration {
        /// Names of the advertised methods.
        methods: Vec<String>,
    },
    /// An executer reported the result of a task.
    ResultAcknowledgement {
        /// Identifier of the task whose result was reported.
        task: String,
    },
}

impl StateUpdate {
    /// Applies the update, returning whether anything changed.
    pub fn apply(&self, registry: &MethodRegistry) -> bool {
        match self {
            Self::MethodRegistration { methods } => {
                for method in methods {
                    registry.add(method);
                }
                !methods.is_empty()
            }
            // The store is freed by the handler; nothing here to change.
            Self::ResultAcknowledgement { .. } => false,
        }
    }

    /// Returns true when [`rollback`](Self::rollback) undoes the update.
    pub fn has_rollback(&self) -> bool {
        matches!(self, Self::MethodRegistration { .. })
    }

    /// Reverts the update, returning whether anything changed.
    pub fn rollback(&self, registry: &MethodRegistry) -> bool {
        match self {
            Self::MethodRegistration { methods } => {
                for method in methods {
                    registry.delete(method);
                }
                !methods.is_empty()
            }
            Self::ResultAcknowledgement { .. } => false,
        }
    }
}

/// Undo log for one connection.
///
/// Dropping the recorder rolls back every recorded update in reverse order,
/// so the registry is restored on every exit path of the connection thread,
/// unwinding included.
#[derive(Debug)]
pub struct StateRecorder {
    registry: Arc<MethodRegistry>,
    undo: Vec<StateUpdate>,
}

impl StateRecorder {
    /// Creates an empty recorder whose rollbacks target `registry`.
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            undo: Vec::new(),
        }
    }

    /// Applies `update` and keeps it for rollback when it changed something
    /// reversible.
    pub fn record(&mut self, update: StateUpdate) -> bool {
        let changed = update.apply(&self.registry);
        if changed && update.has_rollback() {
            self.undo.push(update);
        }
        changed
    }

    /// Number of updates awaiting rollback.
    pub fn pending(&self) -> usize {
        self.undo.len()
    }

    /// Rolls back all recorded updates, newest first.
    pub fn rollback(&mut self) -> usize {
        let mut reverted = 0;
        while let Some(update) = self.undo.pop() {
            if update.rollback(&self.registry) {
                reverted += 1;
            }
        }
        if reverted > 0 {
            debug!(target: STATE_TARGET, reverted, "connection state rolled back");
        }
        reverted
    }
}

impl Drop for StateRecorder {
    fn drop(&mut self) {
        self.rollback();
    }
}
