//! Tracing setup for the binary.
//!
//! The subscriber is installed before the config is read so config loading
//! can log. Its filter starts from `RUST_LOG` (or `warn`) and is swapped for
//! the configured `log_level` once the config is known, unless `RUST_LOG`
//! was set.

use crate::config::Config;
use eyre::{Context, Result};
use tracing::debug;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const DEFAULT_LEVEL: &str = "warn";

/// Handle used to replace the active filter after startup
pub type LogHandle = reload::Handle<EnvFilter, Registry>;

/// Install the global subscriber, writing to stderr
pub fn init() -> LogHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    handle
}

/// Level to switch to once the config is loaded, if any
pub fn configured_level(rust_log_set: bool, config: &Config) -> Option<&str> {
    if rust_log_set {
        return None;
    }
    config.log_level.as_deref()
}

/// Apply the config's `log_level` unless `RUST_LOG` takes precedence
pub fn apply_config(handle: &LogHandle, config: &Config) -> Result<()> {
    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    if let Some(level) = configured_level(rust_log_set, config) {
        let filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log_level: {}", level))?;
        handle.reload(filter).context("Failed to apply log level")?;
        debug!(level, "Applied configured log level");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_level(level: Option<&str>) -> Config {
        Config {
            log_level: level.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn test_configured_level_used_without_rust_log() {
        let config = config_with_level(Some("debug"));
        assert_eq!(configured_level(false, &config), Some("debug"));
    }

    #[test]
    fn test_rust_log_takes_precedence() {
        let config = config_with_level(Some("debug"));
        assert_eq!(configured_level(true, &config), None);
    }

    #[test]
    fn test_no_configured_level() {
        let config = config_with_level(None);
        assert_eq!(configured_level(false, &config), None);
    }

    #[test]
    fn test_reload_swaps_filter() {
        let (_layer, handle): (reload::Layer<EnvFilter, Registry>, LogHandle) =
            reload::Layer::new(EnvFilter::new(DEFAULT_LEVEL));

        handle.reload(EnvFilter::new("debug")).unwrap();
        let current = handle.with_current(|f| f.to_string()).unwrap();
        assert_eq!(current, "debug");
    }
}
