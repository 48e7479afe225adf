//! Shared broker state handed to every connection.

use std::sync::Arc;
use std::time::Duration;

use squ_config::Config;

use crate::protocol::Answer;
use crate::queues::DispatchQueues;
use crate::registry::MethodRegistry;
use crate::state::StateUpdate;
use crate::store::CommandStore;
use crate::task::TaskIdGenerator;

/// Everything a method handler may touch.
#[derive(Debug)]
pub struct DispatchContext {
    pub(crate) store: Arc<CommandStore>,
    pub(crate) queues: DispatchQueues,
    pub(crate) registry: Arc<MethodRegistry>,
    pub(crate) ids: TaskIdGenerator,
    pub(crate) debug: bool,
    pub(crate) default_timeout: Duration,
}

impl DispatchContext {
    /// Builds a context with debug answers off and the default command TTL.
    pub fn new(
        store: Arc<CommandStore>,
        queues: DispatchQueues,
        registry: Arc<MethodRegistry>,
    ) -> Self {
        Self {
            store,
            queues,
            registry,
            ids: TaskIdGenerator::new(),
            debug: false,
            default_timeout: Duration::from_secs_f64(squ_config::DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }

    /// Applies the debug flag and default TTL from `config`.
    #[must_use]
    pub fn configured(mut self, config: &Config) -> Self {
        self.debug = config.debug();
        self.default_timeout = config.default_command_timeout();
        self
    }

    /// Enables or disables error descriptions on answers.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// TTL applied to commands that carry no `timeout` param.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Store holding tasks awaiting a `result`.
    pub fn store(&self) -> &Arc<CommandStore> {
        &self.store
    }

    /// Fresh and redelivered work queues.
    pub fn queues(&self) -> &DispatchQueues {
        &self.queues
    }

    /// Methods currently advertised by executers.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }
}

/// Outcome of handling one command.
#[derive(Debug)]
pub struct Handled {
    /// Reply written back to the caller.
    pub answer: Answer,
    /// Change to record for rollback when the connection closes.
    pub update: Option<StateUpdate>,
}

impl Handled {
    /// An answer with no state change.
    pub fn answer(answer: Answer) -> Self {
        Self {
            answer,
            update: None,
        }
    }

    /// An answer paired with the state change it made.
    pub fn with_update(answer: Answer, update: StateUpdate) -> Self {
        Self {
            answer,
            update: Some(update),
        }
    }
}
