//! Tracing setup for tests.

use tracing_subscriber::EnvFilter;

/// Initializes a test-friendly tracing subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
