//! Shared helpers for Folio integration tests.

use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber honoring `RUST_LOG`, once per process.
///
/// Call at the top of a test to see settlement logs while debugging.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
