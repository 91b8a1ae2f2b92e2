//! Tracing setup for the native module

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`. With the variable
/// unset nothing is emitted. Losing the race to a subscriber installed
/// elsewhere in the host process is fine, hence `try_init`.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
