//! Inbound command envelope.
//!
//! Commands are JSON-RPC shaped objects carried one per line. The `params`
//! member is kept as opaque text: the broker only looks inside it for the few
//! fields it needs (`methods`, `task`, `timeout`) and otherwise forwards it
//! verbatim to executers.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use super::JSONRPC_VERSION;
use super::errors::ProtocolError;

const EMPTY_PARAMS: &str = "{}";

/// A unit of work or a control request sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Protocol version tag; always rewritten to `2.0` on output.
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Client-chosen request identifier echoed in the answer.
    #[serde(default)]
    pub id: i64,
    /// Method name.
    pub method: String,
    /// Opaque parameter payload, normally the text of a JSON object.
    #[serde(default = "default_params", deserialize_with = "params_text")]
    pub params: String,
}

impl Command {
    /// Builds a command with empty params.
    pub fn new(id: i64, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            method: method.into(),
            params: default_params(),
        }
    }

    /// Replaces the params payload.
    #[must_use]
    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// Parses one request line. Trailing whitespace, including the newline
    /// delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedCommand`] when the line is empty, is
    /// not JSON, or lacks a `method`.
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Err(ProtocolError::malformed("empty command line"));
        }
        let mut command: Self =
            serde_json::from_slice(trimmed).map_err(ProtocolError::from_json_error)?;
        if command.method.trim().is_empty() {
            return Err(ProtocolError::malformed("method field is empty"));
        }
        command.jsonrpc = JSONRPC_VERSION.to_owned();
        Ok(command)
    }

    /// Decodes the params payload into a method-specific schema.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidParams`] when the payload does not
    /// match `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_str(&self.params)
            .map_err(|source| ProtocolError::invalid_params(&self.method, source))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Command(id={}, method={})", self.id, self.method)
    }
}

fn default_version() -> String {
    JSONRPC_VERSION.to_owned()
}

fn default_params() -> String {
    EMPTY_PARAMS.to_owned()
}

/// Accepts `params` either as a string or as inline JSON, keeping its text.
fn params_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => default_params(),
        other => other.to_string(),
    })
}
