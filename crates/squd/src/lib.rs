//! SQU command-dispatch broker.
//!
//! The broker accepts line-delimited JSON-RPC commands over TCP. Receiver
//! sockets submit work; executer sockets advertise the methods they serve,
//! fetch work with `execute` and report completion with `result`.
//!
//! Work handed to an executer is parked in a sharded [`CommandStore`] under a
//! fresh task id. A background sweep redelivers any task whose TTL elapses
//! before its result arrives, so a crashed or stalled worker never loses a
//! command. Method advertisements are reference counted in a
//! [`MethodRegistry`] and undone by a per-connection [`StateRecorder`] when
//! the executer disconnects.
//!
//! Startup follows a fixed order: configuration is loaded and validated,
//! telemetry is installed, the store, queues and registry are built, sockets
//! are bound and finally everything is registered with a
//! [`SubsystemCoordinator`](lifecycle::SubsystemCoordinator), which carries
//! the stop broadcast on shutdown.

mod bootstrap;
pub mod dispatch;
mod health;
pub mod lifecycle;
mod millis;
mod process;
pub mod protocol;
mod queues;
mod registry;
mod state;
pub mod store;
mod task;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    BrokerRuntime, LaunchError, ShutdownCause, ShutdownError, ShutdownSignal,
    SystemShutdownSignal, TerminationSignal, run_broker,
};
pub use queues::DispatchQueues;
pub use registry::MethodRegistry;
pub use state::{StateRecorder, StateUpdate};
pub use store::{CommandStore, RedeliveryHandler, StoreError};
pub use task::TaskIdGenerator;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
