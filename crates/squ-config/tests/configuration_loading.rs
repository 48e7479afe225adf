use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use tempfile::TempDir;

use squ_config::{Config, ConnectionRole, LogFormat};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = env_lock();
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe on edition 2024; the guard restores
        // the previous value so other tests inherit a clean environment.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().expect("env mutex poisoned")
}

fn write_config(dir: &TempDir, body: &str) -> OsString {
    let path = dir.path().join("squ.toml");
    fs::write(&path, body).expect("write config file");
    path.into_os_string()
}

#[test]
fn loads_sockets_and_timings_from_file() {
    let _lock = env_lock();
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(
        &dir,
        r#"
sweep_interval_ms = 50
log_format = "compact"
sockets = [
    { role = "receiver", addr = "127.0.0.1", port = 7000 },
    { role = "executer", addr = "127.0.0.1", port = 7001 },
]
"#,
    );

    let args = vec![
        OsString::from("squd"),
        OsString::from("--config-path"),
        path,
    ];
    let config = Config::load_from_iter(args).expect("load config");

    assert_eq!(config.sweep_interval(), Duration::from_millis(50));
    assert_eq!(config.log_format(), LogFormat::Compact);
    let roles: Vec<_> = config.sockets().iter().map(|target| target.role).collect();
    assert_eq!(roles, [ConnectionRole::Receiver, ConnectionRole::Executer]);
    assert_eq!(config.poll_timeout(), Duration::from_millis(100));
}

#[test]
fn environment_overrides_sweep_interval() {
    let _env = EnvOverride::set_var("SQU_SWEEP_INTERVAL_MS", OsStr::new("40"));

    let config = Config::load_from_iter([OsString::from("squd")]).expect("load config");

    assert_eq!(config.sweep_interval(), Duration::from_millis(40));
}

#[test]
fn cli_flag_wins_over_file() {
    let _lock = env_lock();
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "poll_timeout_ms = 300\n");

    let args = vec![
        OsString::from("squd"),
        OsString::from("--config-path"),
        path,
        OsString::from("--poll-timeout-ms"),
        OsString::from("20"),
    ];
    let config = Config::load_from_iter(args).expect("load config");

    assert_eq!(config.poll_timeout(), Duration::from_millis(20));
}

#[test]
fn malformed_file_is_reported() {
    let _lock = env_lock();
    let dir = TempDir::new().expect("temp dir");
    let path = write_config(&dir, "sweep_interval_ms = \"soon\"\n");

    let args = vec![
        OsString::from("squd"),
        OsString::from("--config-path"),
        path,
    ];
    let error = Config::load_from_iter(args).expect_err("loading must fail");

    assert!(!error.to_string().is_empty());
}
