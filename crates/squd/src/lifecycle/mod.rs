//! Lifecycle control for independently running broker components.
//!
//! Components register with a [`SubsystemCoordinator`] as [`Subsystem`]s. The
//! coordinator broadcasts a [`LifecycleCommand`] to all of them and waits for
//! each to answer with an [`Ack`] before a deadline.

mod coordinator;

use std::fmt;

use crossbeam::channel::Sender;

pub use self::coordinator::SubsystemCoordinator;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Numeric identity of a registered subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsystemId(pub u16);

impl SubsystemId {
    /// The in-flight command store.
    pub const COMMAND_STORE: Self = Self(1);
    /// The set of socket listeners.
    pub const LISTENERS: Self = Self(2);
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::COMMAND_STORE => formatter.write_str("command-store"),
            Self::LISTENERS => formatter.write_str("listeners"),
            Self(other) => write!(formatter, "subsystem-{other}"),
        }
    }
}

/// Commands a subsystem may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCommand {
    /// Stop accepting work, drain, then acknowledge.
    Stop,
    /// Report status.
    Status,
    /// Acknowledge that the subsystem is running.
    Start,
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stop => "stop",
            Self::Status => "status",
            Self::Start => "start",
        };
        formatter.write_str(name)
    }
}

/// Acknowledgement sent by a subsystem once it has handled a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Subsystem that handled the command.
    pub subsystem: SubsystemId,
    /// Command being acknowledged.
    pub command: LifecycleCommand,
}

impl Ack {
    /// Acknowledges `command` on behalf of `subsystem`.
    #[must_use]
    pub fn new(subsystem: SubsystemId, command: LifecycleCommand) -> Self {
        Self { subsystem, command }
    }
}

/// A component driven by lifecycle broadcasts.
///
/// `handle_command` runs on a dedicated thread per broadcast and may block
/// until the subsystem is quiescent. Commands the subsystem does not support
/// should be logged and left unacknowledged.
pub trait Subsystem: Send + Sync {
    /// Identity used to match acknowledgements.
    fn id(&self) -> SubsystemId;

    /// Handles one command, sending an [`Ack`] on `acks` when done.
    fn handle_command(&self, command: LifecycleCommand, acks: &Sender<Ack>);
}
