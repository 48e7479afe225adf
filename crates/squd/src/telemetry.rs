//! Log subscriber installation for the broker.
//!
//! The filter comes from `log_filter`. Running with `debug` set also lowers
//! every `squd` target to `debug`, so task dispatch, redelivery and
//! lifecycle broadcasts are traced without editing the filter expression.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::fmt;

use squ_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");
const BROKER_DEBUG_DIRECTIVE: &str = concat!(env!("CARGO_PKG_NAME"), "=debug");

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Settings of the subscriber that won the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    broker_debug: bool,
}

impl TelemetryHandle {
    /// Output format of the installed subscriber.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Whether broker targets were lowered to `debug`.
    #[must_use]
    pub fn broker_debug(&self) -> bool {
        self.broker_debug
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was already registered.
    #[error("failed to install telemetry subscriber: {source}")]
    Subscriber {
        /// Error from `tracing`.
        #[source]
        source: SetGlobalDefaultError,
    },
}

/// Installs the global tracing subscriber on first use.
///
/// The first successful call decides the output; later calls return the
/// handle describing that subscriber whatever `config` they pass.
///
/// # Errors
///
/// Fails when `log_filter` does not parse or when a foreign subscriber is
/// already installed.
///
/// # Examples
///
/// ```rust
/// use squ_config::Config;
/// use squd::telemetry;
///
/// # fn main() -> Result<(), squd::TelemetryError> {
/// let config = Config::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// assert_eq!(first, second);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED.get_or_try_init(|| install(config)).copied()
}

/// Builds the filter for `config`, adding the broker debug directive when
/// `debug` is set.
pub(crate) fn broker_filter(config: &Config) -> Result<EnvFilter, TelemetryError> {
    let invalid = |message: String| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message,
    };
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| invalid(error.to_string()))?;
    if !config.debug() {
        return Ok(filter);
    }
    let directive = BROKER_DEBUG_DIRECTIVE
        .parse::<Directive>()
        .map_err(|error| invalid(error.to_string()))?;
    Ok(filter.add_directive(directive))
}

fn install(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let filter = broker_filter(config)?;
    let handle = TelemetryHandle {
        format: config.log_format(),
        broker_debug: config.debug(),
    };

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            // Connection threads are named after their peer.
            .with_thread_names(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };
    let subscriber: Box<dyn Subscriber + Send + Sync> = match handle.format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| TelemetryError::Subscriber { source })?;

    info!(
        target: TELEMETRY_TARGET,
        format = %handle.format,
        filter = config.log_filter(),
        broker_debug = handle.broker_debug,
        "telemetry installed"
    );
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tracing::level_filters::LevelFilter;

    fn config(log_filter: &str, debug: bool) -> Config {
        Config {
            log_filter: log_filter.to_owned(),
            debug,
            ..Config::default()
        }
    }

    #[rstest]
    #[case("info", false, LevelFilter::INFO)]
    #[case("info", true, LevelFilter::DEBUG)]
    #[case("error", false, LevelFilter::ERROR)]
    #[case("warn,squd::store=trace", true, LevelFilter::TRACE)]
    fn debug_flag_lowers_broker_targets(
        #[case] log_filter: &str,
        #[case] debug: bool,
        #[case] expected: LevelFilter,
    ) {
        let filter = broker_filter(&config(log_filter, debug)).expect("filter parses");
        assert_eq!(filter.max_level_hint(), Some(expected));
    }

    #[rstest]
    fn debug_directive_targets_the_broker_crate() {
        let filter = broker_filter(&config("warn", true)).expect("filter parses");
        assert!(filter.to_string().contains("squd=debug"));
    }

    #[rstest]
    fn unparsable_filter_is_reported_verbatim() {
        let error = broker_filter(&config("squd=loudest", false)).expect_err("filter rejected");
        assert!(
            matches!(&error, TelemetryError::Filter { filter, .. } if filter == "squd=loudest"),
            "unexpected error: {error}"
        );
    }

    #[rstest]
    fn repeated_initialisation_returns_the_installed_handle() {
        let first = initialise(&config("info", false)).expect("first initialisation");
        let second = initialise(&config("trace", true)).expect("second initialisation");
        assert_eq!(first, second);
    }
}
