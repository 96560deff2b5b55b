//! Tracing subscriber setup
//!
//! The filter comes from `FLOWSPLIT_LOG` when set, otherwise from the
//! configured level. A bare level such as "debug" is scoped to this crate so
//! dependency noise stays at warn.

use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable overriding the configured log filter
pub const LOG_ENV: &str = "FLOWSPLIT_LOG";

/// Build the filter directive string for a configured level
pub fn filter_directives(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return "warn,flowsplit=info".to_string();
    }
    // Custom directive strings (with ',' or '=') are respected as-is
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("warn,flowsplit={}", normalized)
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = std::env::var(LOG_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| filter_directives(log_level));
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(filter = %spec, json = json_format, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_is_scoped() {
        assert_eq!(filter_directives("debug"), "warn,flowsplit=debug");
        assert_eq!(filter_directives(""), "warn,flowsplit=info");
    }

    #[test]
    fn test_custom_directives_kept() {
        assert_eq!(
            filter_directives("info,flowsplit::services=trace"),
            "info,flowsplit::services=trace"
        );
    }

    #[test]
    fn test_setup_twice_does_not_panic() {
        setup_logging("info", false);
        setup_logging("debug", true);
    }
}
