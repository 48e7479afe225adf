//! The running broker: every subsystem wired together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use squ_config::{Config, SocketTarget};

use crate::dispatch::{DispatchConnectionHandler, DispatchContext};
use crate::health::HealthReporter;
use crate::lifecycle::{LifecycleCommand, Subsystem, SubsystemCoordinator};
use crate::queues::DispatchQueues;
use crate::registry::MethodRegistry;
use crate::store::CommandStore;
use crate::transport::{ListenerSet, SocketListener};

use super::PROCESS_TARGET;
use super::errors::LaunchError;

/// Store, queues, registry and listeners of one broker instance.
///
/// Dropping the runtime without calling [`shutdown`](Self::shutdown) still
/// signals the sweep thread and every accept loop to stop.
pub struct BrokerRuntime {
    context: Arc<DispatchContext>,
    listeners: Arc<ListenerSet>,
    coordinator: SubsystemCoordinator,
    shutdown_timeout: Duration,
}

impl BrokerRuntime {
    /// Builds every subsystem and starts accepting connections.
    ///
    /// Sockets are bound in configuration order; the first failure aborts
    /// startup and drops whatever was already running.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Store`] when the sweep thread cannot start and
    /// [`LaunchError::Listener`] when a socket cannot be bound or served.
    pub fn start(config: &Config, reporter: &dyn HealthReporter) -> Result<Self, LaunchError> {
        let queues = DispatchQueues::new(config.queue_capacity(), config.poll_timeout());
        let redelivery = queues.clone();
        let store = CommandStore::start(
            config.sweep_interval(),
            Box::new(move |task, command| {
                warn!(target: PROCESS_TARGET, %task, %command, "task expired without result");
                redelivery.redeliver(command);
            }),
        )?;
        let registry = Arc::new(MethodRegistry::new());
        let context = Arc::new(
            DispatchContext::new(Arc::clone(&store), queues, registry).configured(config),
        );

        let listeners = Arc::new(ListenerSet::new());
        for target in config.sockets() {
            let listener = SocketListener::bind(target)?.with_keepalive(config.keepalive());
            let local_addr = listener.local_addr();
            let handler = Arc::new(DispatchConnectionHandler::new(
                listener.target().role,
                Arc::clone(&context),
            ));
            let handle = listener.start(handler)?;
            listeners.push(target.clone(), local_addr, handle);
            reporter.listener_ready(target, local_addr);
        }

        // Listeners first, so no new work arrives while the store drains.
        let mut coordinator = SubsystemCoordinator::new();
        coordinator.register(Arc::clone(&listeners) as Arc<dyn Subsystem>);
        coordinator.register(store);

        info!(
            target: PROCESS_TARGET,
            sockets = listeners.len(),
            subsystems = coordinator.len(),
            "broker running"
        );
        Ok(Self {
            context,
            listeners,
            coordinator,
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Socket targets with the addresses they actually bound.
    pub fn local_addrs(&self) -> Vec<(SocketTarget, Option<SocketAddr>)> {
        self.listeners.local_addrs()
    }

    /// Shared state seen by every connection.
    pub fn context(&self) -> &Arc<DispatchContext> {
        &self.context
    }

    /// Broadcasts stop and waits for every subsystem.
    ///
    /// Returns `true` when all of them acknowledged within the configured
    /// shutdown timeout.
    pub fn shutdown(&self, reporter: &dyn HealthReporter) -> bool {
        reporter.shutdown_started();
        let clean = self
            .coordinator
            .broadcast(LifecycleCommand::Stop, self.shutdown_timeout);
        reporter.shutdown_completed(clean);
        clean
    }

    /// Time allowed for every subsystem to acknowledge the stop broadcast.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}
