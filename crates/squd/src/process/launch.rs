//! Supervises broker launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::millis::saturating_millis;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::runtime::BrokerRuntime;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the broker.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) shutdown: S,
    pub(crate) reporter: Arc<dyn HealthReporter>,
}

/// Runs the broker using the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap or startup fails, when the
/// signal handlers cannot be installed, or when some subsystem misses the
/// shutdown deadline.
pub fn run_broker() -> Result<(), LaunchError> {
    run_broker_with(LaunchPlan {
        loader: SystemConfigLoader,
        shutdown: SystemShutdownSignal::new(),
        reporter: Arc::new(StructuredHealthReporter::new()),
    })
}

/// Runs the broker with injected collaborators.
pub(crate) fn run_broker_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        shutdown,
        reporter,
    } = plan;

    let config = bootstrap_with(&loader, reporter.as_ref())?.into_config();
    let runtime = BrokerRuntime::start(&config, reporter.as_ref())?;
    let cause = shutdown.wait()?;

    info!(target: PROCESS_TARGET, %cause, "shutdown requested");
    if !runtime.shutdown(reporter.as_ref()) {
        return Err(LaunchError::ShutdownTimeout {
            timeout_ms: saturating_millis(runtime.shutdown_timeout()),
        });
    }
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
