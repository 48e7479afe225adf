//! Blocking wait for a termination request.
//!
//! The broker stops on SIGTERM, SIGINT, SIGQUIT and SIGHUP alike; none of
//! them reloads configuration. Whatever ended the wait is handed back as a
//! [`ShutdownCause`] so the stop sequence can log it.

use std::fmt;
use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::debug;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed and reports what triggered it.
    fn wait(&self) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install handlers for {signals}: {source}")]
    Install {
        /// Comma separated names of the signals being watched.
        signals: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal iterator ended without delivering anything.
    #[error("signal stream closed before a termination signal arrived")]
    Closed,
}

/// POSIX signals that stop the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// `SIGTERM`, sent by service managers.
    Terminate,
    /// `SIGINT`, usually Ctrl-C on a terminal.
    Interrupt,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`, the controlling terminal went away.
    Hangup,
}

impl TerminationSignal {
    /// Every signal the broker watches.
    pub const ALL: [Self; 4] = [Self::Terminate, Self::Interrupt, Self::Quit, Self::Hangup];

    /// Raw signal number.
    #[must_use]
    pub fn number(self) -> i32 {
        match self {
            Self::Terminate => SIGTERM,
            Self::Interrupt => SIGINT,
            Self::Quit => SIGQUIT,
            Self::Hangup => SIGHUP,
        }
    }

    /// Maps a raw signal number back to a watched signal.
    #[must_use]
    pub fn from_number(number: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.number() == number)
    }

    /// Conventional upper-case name, e.g. `SIGTERM`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Quit => "SIGQUIT",
            Self::Hangup => "SIGHUP",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// What ended a [`ShutdownSignal::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A watched POSIX signal was delivered.
    Signal(TerminationSignal),
    /// Shutdown was requested in-process without a signal.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(formatter, "signal {signal}"),
            Self::Requested => formatter.write_str("in-process request"),
        }
    }
}

/// Shutdown listener backed by `signal-hook`.
#[derive(Debug, Clone)]
pub struct SystemShutdownSignal {
    signals: Vec<TerminationSignal>,
}

impl Default for SystemShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemShutdownSignal {
    /// Watches every [`TerminationSignal`]; handlers are installed on the
    /// first [`ShutdownSignal::wait`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: TerminationSignal::ALL.to_vec(),
        }
    }

    /// Signals this listener watches, in installation order.
    #[must_use]
    pub fn signals(&self) -> &[TerminationSignal] {
        &self.signals
    }

    fn watched_names(&self) -> String {
        self.signals
            .iter()
            .map(|signal| signal.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let numbers: Vec<i32> = self.signals.iter().map(|signal| signal.number()).collect();
        let mut signals = Signals::new(numbers).map_err(|source| ShutdownError::Install {
            signals: self.watched_names(),
            source,
        })?;
        debug!(
            target: PROCESS_TARGET,
            signals = %self.watched_names(),
            "waiting for termination signal"
        );
        signals
            .forever()
            .find_map(TerminationSignal::from_number)
            .map(ShutdownCause::Signal)
            .ok_or(ShutdownError::Closed)
    }
}
