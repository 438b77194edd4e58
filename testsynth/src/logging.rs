//! Development-time tracing for debugging the tool.
//!
//! Tracing is dev diagnostics via `RUST_LOG`, written to stderr. Product
//! output (per-attempt indicators, the final summary) goes to stdout and is
//! unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn` if unset. Output: stderr, compact.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
