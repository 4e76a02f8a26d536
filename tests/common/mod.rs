//! Shared integration-test setup (SPEC_FULL §A.4).

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a `tracing-subscriber` fmt layer once per test binary, so
/// `RUST_LOG=byexample_core=trace cargo test -- --nocapture` shows the
/// `tracing::debug!`/`tracing::warn!` events emitted while harvesting.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
