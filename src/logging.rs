//! Tracing subscriber setup for the binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the executable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a caller override is set.
pub const DEFAULT_FILTER: &str = "info";

/// Create the filter: `RUST_LOG` if set, otherwise `filter`, otherwise
/// [`DEFAULT_FILTER`].
pub fn env_filter(filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)))
}

/// Install a console subscriber with uptime timestamps and module targets.
///
/// Calling this twice is harmless: the second call leaves the first
/// subscriber in place.
pub fn init_logging(filter: Option<&str>) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(console_layer)
        .try_init();
}
