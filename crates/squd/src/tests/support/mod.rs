//! Test harness utilities shared by the behavioural suites.

mod client;
mod config_loader;
mod reporter;
mod shutdown;

pub use client::{LineClient, error_code, result_json};
pub use config_loader::{FailingConfigLoader, TestConfigLoader, broker_config};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use shutdown::TestShutdownSignal;

/// Outcome of a behaviour step.
pub type StepResult = Result<(), String>;
