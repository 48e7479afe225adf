//! Process supervision: startup, signal handling and orderly shutdown.

mod errors;
pub(crate) mod launch;
mod runtime;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_broker;
pub use runtime::BrokerRuntime;
pub use shutdown::{
    ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal, TerminationSignal,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
