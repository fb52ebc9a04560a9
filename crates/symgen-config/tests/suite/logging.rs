use std::ffi::OsString;
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use symgen_config::{init_tracing, LoggingConfig};
use tracing_subscriber::filter::LevelFilter;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

fn logging(level: &str) -> LoggingConfig {
    LoggingConfig {
        level: level.to_owned(),
        ..Default::default()
    }
}

#[test]
fn configured_level_drives_the_filter() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset("RUST_LOG");

    assert_eq!(logging("info").env_filter().max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(logging("WARNING").env_filter().max_level_hint(), Some(LevelFilter::WARN));
    assert_eq!(
        logging("warn,symgen_resolve=debug").env_filter().max_level_hint(),
        Some(LevelFilter::DEBUG)
    );
}

#[test]
fn invalid_level_falls_back_to_info() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset("RUST_LOG");

    assert_eq!(
        logging("symgen_resolve=loud").env_filter().max_level_hint(),
        Some(LevelFilter::INFO)
    );
}

#[test]
fn rust_log_is_merged_into_the_configured_level() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    {
        let _env = EnvVarGuard::set("RUST_LOG", "symgen_resolve=trace");
        assert_eq!(logging("warn").env_filter().max_level_hint(), Some(LevelFilter::TRACE));
    }
    {
        let _env = EnvVarGuard::set("RUST_LOG", "  ");
        assert_eq!(logging("warn").env_filter().max_level_hint(), Some(LevelFilter::WARN));
    }
    {
        // An unusable RUST_LOG leaves the configured level in place.
        let _env = EnvVarGuard::set("RUST_LOG", "symgen_resolve=loud");
        assert_eq!(logging("debug").env_filter().max_level_hint(), Some(LevelFilter::DEBUG));
    }
}

#[test]
fn init_tracing_can_be_called_twice() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset("RUST_LOG");

    let config = logging("debug");
    init_tracing(&config);
    init_tracing(&LoggingConfig {
        json: true,
        ..config
    });
    assert!(tracing::dispatcher::has_been_set());
    tracing::debug!(target: "symgen_config", "subscriber installed");
}
