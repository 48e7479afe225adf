/// Default interval between two store sweeps, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 250;

/// Default idle wait of an `execute` poll, in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Default bound of each dispatch queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10 * 1024;

/// Default time-to-live for commands without an explicit timeout, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 60.0;

/// Default deadline of the shutdown broadcast, in milliseconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// Default TCP keep-alive idle period, in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 60;

/// Default log filter expression used by the broker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the broker.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
