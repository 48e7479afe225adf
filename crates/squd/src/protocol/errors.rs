//! Error types for wire envelope parsing and encoding.

use thiserror::Error;

/// Errors surfaced while decoding requests or encoding answers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Request line could not be parsed as a command.
    #[error("malformed command: {message}")]
    MalformedCommand {
        /// What was wrong with the line.
        message: String,
        /// JSON decoder error, when decoding got that far.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The command's `params` payload does not match the method's schema.
    #[error("invalid params for '{method}': {message}")]
    InvalidParams {
        /// Method whose params were rejected.
        method: String,
        /// What was wrong with the params.
        message: String,
        /// JSON decoder error, when decoding got that far.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// An answer or task command could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Creates a malformed command error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedCommand {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed command error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCommand {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid params error for the given method.
    pub fn invalid_params(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidParams {
            method: method.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }
}
