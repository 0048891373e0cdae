//! Logging Infrastructure
//!
//! Structured logging setup via `tracing-subscriber`. `RUST_LOG` takes precedence
//! over the configured level.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. by the host
/// application), in which case the existing one is kept.
pub fn init_logger(log_level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("entitlement_engine={log_level},{log_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
