//! Shared configuration for the SQU broker.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, an
//! optional TOML file (`--config-path` or `SQU_CONFIG_PATH`), `SQU_*`
//! environment variables and finally command-line flags. The resolved
//! [`Config`] describes the sockets to listen on, the timing of the in-flight
//! command store and the logging setup.

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_KEEPALIVE_SECS, DEFAULT_LOG_FILTER,
    DEFAULT_POLL_TIMEOUT_MS, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT_MS,
    DEFAULT_SWEEP_INTERVAL_MS, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{ConnectionRole, SocketTarget, SocketTargetParseError};

/// Resolved broker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SQU")]
pub struct Config {
    /// Listening sockets and the role of the clients each one accepts.
    #[serde(default)]
    #[ortho_config(merge_strategy = "append")]
    pub sockets: Vec<SocketTarget>,
    /// Interval between two sweeps of the in-flight command store.
    #[ortho_config(default = DEFAULT_SWEEP_INTERVAL_MS)]
    pub sweep_interval_ms: u64,
    /// Idle wait of an `execute` poll when no work is queued.
    #[ortho_config(default = DEFAULT_POLL_TIMEOUT_MS)]
    pub poll_timeout_ms: u64,
    /// Bound of each dispatch queue.
    #[ortho_config(default = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
    /// Time-to-live applied to commands without a usable `timeout` parameter.
    #[ortho_config(default = DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub default_timeout_secs: f64,
    /// Deadline for every subsystem to acknowledge the stop broadcast.
    #[ortho_config(default = DEFAULT_SHUTDOWN_TIMEOUT_MS)]
    pub shutdown_timeout_ms: u64,
    /// TCP keep-alive idle period requested for accepted connections.
    #[ortho_config(default = DEFAULT_KEEPALIVE_SECS)]
    pub keepalive_secs: u64,
    /// Enables the debug-only executer methods (`uid`, `send`) and lowers
    /// broker log targets to `debug`.
    #[ortho_config(default = false)]
    pub debug: bool,
    /// Log filter expression understood by `tracing-subscriber`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the structured logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sockets: Vec::new(),
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            keepalive_secs: DEFAULT_KEEPALIVE_SECS,
            debug: false,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Configured listening sockets.
    #[must_use]
    pub fn sockets(&self) -> &[SocketTarget] {
        &self.sockets
    }

    /// Store sweep interval. Only positive values are honoured; zero falls
    /// back to [`DEFAULT_SWEEP_INTERVAL_MS`].
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        if self.sweep_interval_ms > 0 {
            Duration::from_millis(self.sweep_interval_ms)
        } else {
            Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS)
        }
    }

    /// Idle wait of an `execute` poll.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Bound of each dispatch queue (at least one slot).
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Time-to-live for commands that carry no usable timeout.
    #[must_use]
    pub fn default_command_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_COMMAND_TIMEOUT_SECS))
    }

    /// Deadline for the stop broadcast.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Keep-alive idle period for accepted connections.
    #[must_use]
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    /// Whether debug-only methods and debug logging are enabled.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Checks the invariants the broker relies on at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSockets`] when no socket target is configured
    /// and [`ConfigError::InvalidDefaultTimeout`] when the default command
    /// timeout is not a positive number of seconds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sockets.is_empty() {
            return Err(ConfigError::NoSockets);
        }
        if !(self.default_timeout_secs.is_finite() && self.default_timeout_secs > 0.0) {
            return Err(ConfigError::InvalidDefaultTimeout {
                value: self.default_timeout_secs,
            });
        }
        Ok(())
    }
}

/// Semantic configuration problems detected after loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No socket targets were configured.
    #[error("no sockets configured; add at least one receiver or executer socket")]
    NoSockets,
    /// The default command timeout is unusable.
    #[error("default command timeout must be a positive number of seconds, got {value}")]
    InvalidDefaultTimeout {
        /// Configured value.
        value: f64,
    },
}
