//! Broadcast and acknowledgement collection.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, warn};

use crate::millis::saturating_millis;

use super::{Ack, LIFECYCLE_TARGET, LifecycleCommand, Subsystem, SubsystemId};

/// Registry of subsystems plus the shared acknowledgement channel.
pub struct SubsystemCoordinator {
    subsystems: Vec<Arc<dyn Subsystem>>,
    acks_tx: Sender<Ack>,
    acks_rx: Receiver<Ack>,
}

impl Default for SubsystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SubsystemCoordinator {
    /// Creates a coordinator with no registered subsystems.
    #[must_use]
    pub fn new() -> Self {
        let (acks_tx, acks_rx) = channel::unbounded();
        Self {
            subsystems: Vec::new(),
            acks_tx,
            acks_rx,
        }
    }

    /// Adds a subsystem to every later broadcast.
    pub fn register(&mut self, subsystem: Arc<dyn Subsystem>) {
        debug!(
            target: LIFECYCLE_TARGET,
            subsystem = %subsystem.id(),
            "subsystem registered"
        );
        self.subsystems.push(subsystem);
    }

    /// Number of registered subsystems.
    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    /// Sends `command` to every subsystem and waits for their acknowledgements.
    ///
    /// Returns `true` iff every registered subsystem acknowledged `command`
    /// before `timeout` elapsed. Acknowledgements for other commands, from
    /// unknown subsystems, or repeated ones are put back on the channel once
    /// the wait ends.
    pub fn broadcast(&self, command: LifecycleCommand, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let expected: BTreeSet<SubsystemId> =
            self.subsystems.iter().map(|subsystem| subsystem.id()).collect();
        debug!(
            target: LIFECYCLE_TARGET,
            %command,
            subsystems = expected.len(),
            timeout_ms = saturating_millis(timeout),
            "broadcasting lifecycle command"
        );

        for subsystem in &self.subsystems {
            self.dispatch(Arc::clone(subsystem), command);
        }

        let mut acknowledged = BTreeSet::new();
        let mut deferred = Vec::new();
        while acknowledged.len() < expected.len() {
            let Ok(ack) = self.acks_rx.recv_deadline(deadline) else {
                let outstanding: Vec<String> = expected
                    .difference(&acknowledged)
                    .map(ToString::to_string)
                    .collect();
                warn!(
                    target: LIFECYCLE_TARGET,
                    %command,
                    outstanding = ?outstanding,
                    "subsystems did not acknowledge in time"
                );
                break;
            };

            if ack.command != command || !expected.contains(&ack.subsystem) {
                debug!(
                    target: LIFECYCLE_TARGET,
                    subsystem = %ack.subsystem,
                    command = %ack.command,
                    "deferring unrelated acknowledgement"
                );
                deferred.push(ack);
            } else if !acknowledged.insert(ack.subsystem) {
                warn!(
                    target: LIFECYCLE_TARGET,
                    subsystem = %ack.subsystem,
                    %command,
                    "duplicate acknowledgement"
                );
                deferred.push(ack);
            } else {
                debug!(
                    target: LIFECYCLE_TARGET,
                    subsystem = %ack.subsystem,
                    %command,
                    "acknowledged"
                );
            }
        }

        for ack in deferred {
            // The coordinator owns the receiver, so the channel cannot be closed.
            let _ = self.acks_tx.send(ack);
        }
        acknowledged.len() == expected.len()
    }

    fn dispatch(&self, subsystem: Arc<dyn Subsystem>, command: LifecycleCommand) {
        let acks = self.acks_tx.clone();
        let id = subsystem.id();
        let spawned = thread::Builder::new()
            .name(format!("squ-lifecycle-{id}"))
            .spawn(move || subsystem.handle_command(command, &acks));
        if let Err(source) = spawned {
            error!(
                target: LIFECYCLE_TARGET,
                subsystem = %id,
                %command,
                error = %source,
                "failed to spawn lifecycle thread"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use rstest::{fixture, rstest};

    mock! {
        Component {}
        impl Subsystem for Component {
            fn id(&self) -> SubsystemId;
            fn handle_command(&self, command: LifecycleCommand, acks: &Sender<Ack>);
        }
    }

    const SHORT: Duration = Duration::from_millis(200);

    fn acking(id: SubsystemId) -> MockComponent {
        let mut subsystem = MockComponent::new();
        subsystem.expect_id().return_const(id);
        subsystem
            .expect_handle_command()
            .returning(move |command, acks| {
                let _ = acks.send(Ack::new(id, command));
            });
        subsystem
    }

    fn silent(id: SubsystemId) -> MockComponent {
        let mut subsystem = MockComponent::new();
        subsystem.expect_id().return_const(id);
        subsystem.expect_handle_command().return_const(());
        subsystem
    }

    #[fixture]
    fn coordinator() -> SubsystemCoordinator {
        SubsystemCoordinator::new()
    }

    #[rstest]
    fn empty_coordinator_succeeds_immediately(coordinator: SubsystemCoordinator) {
        assert!(coordinator.is_empty());
        assert!(coordinator.broadcast(LifecycleCommand::Stop, SHORT));
    }

    #[rstest]
    fn all_acknowledged_returns_true(mut coordinator: SubsystemCoordinator) {
        coordinator.register(Arc::new(acking(SubsystemId::COMMAND_STORE)));
        coordinator.register(Arc::new(acking(SubsystemId::LISTENERS)));

        assert!(coordinator.broadcast(LifecycleCommand::Stop, Duration::from_secs(2)));
    }

    #[rstest]
    fn silent_subsystem_times_out(mut coordinator: SubsystemCoordinator) {
        coordinator.register(Arc::new(acking(SubsystemId::COMMAND_STORE)));
        coordinator.register(Arc::new(silent(SubsystemId::LISTENERS)));

        let started = Instant::now();
        assert!(!coordinator.broadcast(LifecycleCommand::Stop, SHORT));
        assert!(started.elapsed() >= SHORT);
    }

    #[rstest]
    fn stale_acknowledgements_do_not_count(mut coordinator: SubsystemCoordinator) {
        coordinator.register(Arc::new(silent(SubsystemId::COMMAND_STORE)));
        coordinator
            .acks_tx
            .send(Ack::new(SubsystemId::COMMAND_STORE, LifecycleCommand::Start))
            .expect("queue stale ack");
        coordinator
            .acks_tx
            .send(Ack::new(SubsystemId(99), LifecycleCommand::Stop))
            .expect("queue unknown ack");

        assert!(!coordinator.broadcast(LifecycleCommand::Stop, SHORT));
        assert_eq!(coordinator.acks_rx.len(), 2, "deferred acks are re-queued");
    }

    #[rstest]
    fn re_queued_acknowledgement_satisfies_later_broadcast(mut coordinator: SubsystemCoordinator) {
        coordinator.register(Arc::new(silent(SubsystemId::COMMAND_STORE)));
        coordinator
            .acks_tx
            .send(Ack::new(SubsystemId::COMMAND_STORE, LifecycleCommand::Start))
            .expect("queue early ack");

        assert!(!coordinator.broadcast(LifecycleCommand::Stop, SHORT));
        assert!(coordinator.broadcast(LifecycleCommand::Start, SHORT));
    }

    #[rstest]
    fn duplicate_acknowledgement_is_deferred(mut coordinator: SubsystemCoordinator) {
        let mut subsystem = MockComponent::new();
        subsystem.expect_id().return_const(SubsystemId::COMMAND_STORE);
        subsystem.expect_handle_command().returning(|command, acks| {
            let _ = acks.send(Ack::new(SubsystemId::COMMAND_STORE, command));
            let _ = acks.send(Ack::new(SubsystemId::COMMAND_STORE, command));
        });
        coordinator.register(Arc::new(subsystem));
        coordinator.register(Arc::new(silent(SubsystemId::LISTENERS)));

        assert!(!coordinator.broadcast(LifecycleCommand::Status, SHORT));
        assert_eq!(coordinator.acks_rx.len(), 1);
    }
}
