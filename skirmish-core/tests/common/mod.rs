//! Shared setup for integration tests.

use tracing_subscriber::EnvFilter;

/// Route engine logs to the test writer. Set `RUST_LOG=skirmish_core=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
