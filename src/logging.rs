//! Tracing/logging initialization for the `unmand` binary.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(verbose: bool) {
    let default_level = if verbose { "unmand=debug,info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
