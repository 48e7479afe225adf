//! Defines the unified error surface for broker launch and supervision.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::store::StoreError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the broker process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the broker failed.
    #[error("broker bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The in-flight command store could not start.
    #[error("command store failed to start: {source}")]
    Store {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// A socket listener failed to start.
    #[error("broker socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// Some subsystem did not acknowledge the stop broadcast in time.
    #[error("subsystems did not stop within {timeout_ms} ms")]
    ShutdownTimeout {
        /// Deadline that elapsed.
        timeout_ms: u64,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<StoreError> for LaunchError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
