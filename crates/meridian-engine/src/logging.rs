//! Tracing subscriber setup helpers

use tracing_subscriber::EnvFilter;

/// Install the default subscriber: human-readable output, `info` level
/// unless `RUST_LOG` says otherwise
///
/// Panics if a global subscriber is already set; call once at startup.
pub fn init_default() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Subscriber for tests: captured per-test output, tolerant of repeated
/// initialization across the test binary
pub fn init_testing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
