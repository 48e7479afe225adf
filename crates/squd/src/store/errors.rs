//! Errors raised by the command store.

use std::io;

use thiserror::Error;

/// Errors raised while starting the command store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The sweep thread could not be spawned.
    #[error("failed to spawn store sweep thread: {source}")]
    SpawnSweep {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
