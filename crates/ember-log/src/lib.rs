//! Structured logging for the Ember networking tools.
//!
//! Socket-layer failures surface as one-line `tracing` events; this crate
//! installs the subscriber that makes them visible. Console output carries
//! timestamps, module paths, and severity, filterable via `RUST_LOG` or
//! the configuration's `debug.log_level`.

use ember_config::Config;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber.
///
/// Filter precedence: the `RUST_LOG` environment variable wins, then the
/// config's `debug.log_level`, then `info`. Calling this twice is
/// harmless; the second subscriber is simply not installed.
pub fn init_logging(config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_string(config)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime())
        .try_init();
}

/// An `EnvFilter` with the default filter string (`info`).
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_info() {
        assert_eq!(filter_string(None), "info");
    }

    #[test]
    fn filter_uses_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "trace".to_string();
        assert_eq!(filter_string(Some(&config)), "trace");
    }

    #[test]
    fn empty_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = String::new();
        assert_eq!(filter_string(Some(&config)), "info");
    }

    #[test]
    fn double_initialization_is_harmless() {
        init_logging(None);
        init_logging(None);
    }
}
