//! Lifecycle wrapper around all running listeners.

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use crossbeam::channel::Sender;
use tracing::{info, warn};

use squ_config::SocketTarget;

use super::{LISTENER_TARGET, ListenerHandle};
use crate::lifecycle::{Ack, LifecycleCommand, Subsystem, SubsystemId};

struct RunningListener {
    target: SocketTarget,
    local_addr: Option<SocketAddr>,
    handle: ListenerHandle,
}

/// Owns every accept loop; stopping the set shuts down and joins them.
///
/// Connections already accepted keep running until their peers disconnect.
#[derive(Default)]
pub(crate) struct ListenerSet {
    running: Mutex<Vec<RunningListener>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(
        &self,
        target: SocketTarget,
        local_addr: Option<SocketAddr>,
        handle: ListenerHandle,
    ) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RunningListener {
                target,
                local_addr,
                handle,
            });
    }

    /// Addresses actually bound, in registration order.
    pub(crate) fn local_addrs(&self) -> Vec<(SocketTarget, Option<SocketAddr>)> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|listener| (listener.target.clone(), listener.local_addr))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stops and joins every accept loop. Returns how many were stopped.
    pub(crate) fn stop_all(&self) -> usize {
        let listeners = std::mem::take(
            &mut *self.running.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for listener in &listeners {
            listener.handle.shutdown();
        }
        let stopped = listeners.len();
        for listener in listeners {
            if let Err(error) = listener.handle.join() {
                warn!(
                    target: LISTENER_TARGET,
                    socket = %listener.target,
                    error = %error,
                    "listener did not stop cleanly"
                );
            }
        }
        stopped
    }
}

impl Subsystem for ListenerSet {
    fn id(&self) -> SubsystemId {
        SubsystemId::LISTENERS
    }

    fn handle_command(&self, command: LifecycleCommand, acks: &Sender<Ack>) {
        match command {
            LifecycleCommand::Stop => {
                let stopped = self.stop_all();
                info!(target: LISTENER_TARGET, stopped, "listeners stopped");
            }
            LifecycleCommand::Status => {
                info!(target: LISTENER_TARGET, active = self.len(), "listener status");
            }
            LifecycleCommand::Start => {}
        }
        let _ = acks.send(Ack::new(self.id(), command));
    }
}
