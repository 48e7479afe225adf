//! Lifecycle integration for the command store.

use std::thread;

use crossbeam::channel::Sender;
use tracing::{debug, warn};

use super::{CommandStore, STORE_TARGET};
use crate::lifecycle::{Ack, LifecycleCommand, Subsystem, SubsystemId};

impl Subsystem for CommandStore {
    fn id(&self) -> SubsystemId {
        SubsystemId::COMMAND_STORE
    }

    fn handle_command(&self, command: LifecycleCommand, acks: &Sender<Ack>) {
        match command {
            LifecycleCommand::Stop => {
                self.stop();
                while self.is_active() {
                    thread::sleep(self.sweep_interval());
                }
                debug!(target: STORE_TARGET, volume = self.volume(), "store quiesced");
            }
            LifecycleCommand::Start => {
                debug!(target: STORE_TARGET, "store start acknowledged");
            }
            LifecycleCommand::Status => {
                warn!(target: STORE_TARGET, %command, "unsupported lifecycle command");
                return;
            }
        }
        let _ = acks.send(Ack::new(self.id(), command));
    }
}
