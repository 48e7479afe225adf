use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use url::Url;

/// Role played by the clients connecting to a socket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConnectionRole {
    /// Clients submit work for dispatch.
    Receiver,
    /// Workers register methods, fetch work and report results.
    Executer,
}

/// Declarative configuration for one listening socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SocketTarget {
    /// Role assigned to every connection accepted on this socket.
    pub role: ConnectionRole,
    /// Host name or address to bind.
    pub addr: String,
    /// TCP port to bind; zero asks the OS for an ephemeral port.
    pub port: u16,
}

impl SocketTarget {
    /// Builds a socket target.
    #[must_use]
    pub fn new(role: ConnectionRole, addr: impl Into<String>, port: u16) -> Self {
        Self {
            role,
            addr: addr.into(),
            port,
        }
    }

    /// Builds a receiver socket target.
    #[must_use]
    pub fn receiver(addr: impl Into<String>, port: u16) -> Self {
        Self::new(ConnectionRole::Receiver, addr, port)
    }

    /// Builds an executer socket target.
    #[must_use]
    pub fn executer(addr: impl Into<String>, port: u16) -> Self {
        Self::new(ConnectionRole::Executer, addr, port)
    }

    /// Returns the `host:port` pair suitable for address resolution.
    #[must_use]
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl fmt::Display for SocketTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}@tcp://{}:{}", self.role, self.addr, self.port)
    }
}

impl FromStr for SocketTarget {
    type Err = SocketTargetParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (role, endpoint) = input
            .split_once('@')
            .ok_or_else(|| SocketTargetParseError::MissingRole(input.to_owned()))?;
        let role = ConnectionRole::from_str(role.trim())
            .map_err(|_| SocketTargetParseError::UnknownRole(role.to_owned()))?;
        let url = Url::parse(endpoint.trim())?;
        if url.scheme() != "tcp" {
            return Err(SocketTargetParseError::UnsupportedScheme(
                url.scheme().to_owned(),
            ));
        }
        let host = url
            .host_str()
            .ok_or_else(|| SocketTargetParseError::MissingHost(input.to_owned()))?;
        let port = url
            .port()
            .ok_or_else(|| SocketTargetParseError::MissingPort(input.to_owned()))?;
        Ok(Self::new(role, host, port))
    }
}

/// Errors encountered while parsing a [`SocketTarget`] from text.
#[derive(Debug, Error)]
pub enum SocketTargetParseError {
    /// The `role@` prefix was missing.
    #[error("socket target '{0}' is missing the role prefix (receiver@ or executer@)")]
    MissingRole(String),
    /// The role prefix was not recognised.
    #[error("unknown connection role '{0}'")]
    UnknownRole(String),
    /// Scheme was not recognised.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
