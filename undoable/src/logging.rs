//! Diagnostic tracing for the engine and CLI.
//!
//! Tracing is for debugging only: it goes to stderr and is filtered by
//! `RUST_LOG`. Per-file results are product output and are printed by the CLI
//! regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset, or to debug output for this
/// crate when `verbose` is set.
///
/// # Example
/// ```bash
/// RUST_LOG=undoable=debug undoable apply --changes changes.json
/// ```
pub fn init(verbose: bool) {
    let default_level = if verbose { "undoable=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
