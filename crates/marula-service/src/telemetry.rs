//! # Telemetry Initialization
//!
//! tracing-subscriber setup. The logging channel is load-bearing here: it
//! is where swallowed secondary-write failures become observable.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (e.g. `RUST_LOG=marula_service=debug`),
/// defaulting to `info`. Safe to call more than once; only the first call
/// installs a subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
