//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use squ_config::{Config, SocketTarget};

use crate::bootstrap::ConfigLoader;

/// Fast timings and one receiver plus one executer socket on ephemeral ports.
pub fn broker_config() -> Config {
    Config {
        sockets: vec![
            SocketTarget::receiver("127.0.0.1", 0),
            SocketTarget::executer("127.0.0.1", 0),
        ],
        sweep_interval_ms: 50,
        poll_timeout_ms: 50,
        queue_capacity: 64,
        shutdown_timeout_ms: 2_000,
        log_filter: "warn".to_owned(),
        ..Config::default()
    }
}

/// Loader returning a fixed configuration.
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new(broker_config())
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that intentionally fails by passing an invalid CLI flag value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("squd"),
            OsString::from("--sweep-interval-ms"),
            OsString::from("soon"),
        ];
        Config::load_from_iter(args)
    }
}
