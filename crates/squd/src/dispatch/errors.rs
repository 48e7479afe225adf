//! Error types for the connection read loop.

use std::io;

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Errors that end a connection.
///
/// Parse failures of individual commands are answered in-band and never
/// surface here.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line exceeds the maximum allowed size.
    #[error("request too large: more than {max_size} bytes without a newline")]
    RequestTooLarge {
        /// Maximum permitted request size in bytes.
        max_size: usize,
    },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Answer serialisation failed.
    #[error("failed to encode answer: {0}")]
    Encode(#[from] ProtocolError),
}
