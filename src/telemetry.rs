//! Log subscriber setup for the `dj-suite` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to executables. Filtering follows the usual precedence: an explicit
//! directive, then `RUST_LOG`, then `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fallback directive when neither an explicit one nor `RUST_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Builds the filter for the given optional directive string.
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(d) => EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

/// Installs a formatted subscriber writing to stderr. Returns `false` if a
/// global subscriber was already set (e.g. by a test harness).
pub fn init(directive: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
