//! Structured health reporting for broker lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use squ_config::{Config, SocketTarget};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once a socket accepts connections.
    fn listener_ready(&self, target: &SocketTarget, local_addr: Option<SocketAddr>);

    /// Invoked when the stop broadcast begins.
    fn shutdown_started(&self);

    /// Invoked after the stop broadcast; `clean` is false when some
    /// subsystem missed the deadline.
    fn shutdown_completed(&self, clean: bool);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, target: &SocketTarget, local_addr: Option<SocketAddr>) {
        (**self).listener_ready(target, local_addr);
    }

    fn shutdown_started(&self) {
        (**self).shutdown_started();
    }

    fn shutdown_completed(&self, clean: bool) {
        (**self).shutdown_completed(clean);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting broker bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            sockets = config.sockets().len(),
            sweep_interval_ms = config.sweep_interval_ms,
            debug = config.debug(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "broker bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "broker bootstrap failed"
        );
    }

    fn listener_ready(&self, target: &SocketTarget, local_addr: Option<SocketAddr>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            socket = %target,
            local = ?local_addr,
            "socket ready"
        );
    }

    fn shutdown_started(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_started",
            "stopping broker subsystems"
        );
    }

    fn shutdown_completed(&self, clean: bool) {
        if clean {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "shutdown_completed",
                clean,
                "broker stopped"
            );
        } else {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "shutdown_completed",
                clean,
                "broker stopped before every subsystem acknowledged"
            );
        }
    }
}
