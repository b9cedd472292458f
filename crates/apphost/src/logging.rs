//! Logging initialisation for the apphost binaries.
//!
//! `RUST_LOG` always wins. Otherwise the filter from the config file is used,
//! and `info` when neither is set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Picks the filter directive: `RUST_LOG`, then `configured`, then [`DEFAULT_LOG_FILTER`].
pub fn resolve_filter(env_value: Option<&str>, configured: Option<&str>) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .or(configured)
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    let env_value = std::env::var("RUST_LOG").ok();
    let directive = resolve_filter(env_value.as_deref(), filter);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|error| {
        eprintln!("invalid log filter {directive:?}: {error}; falling back to {DEFAULT_LOG_FILTER}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var_os("NO_COLOR").is_none()),
        )
        .with(env_filter)
        .try_init();
}
