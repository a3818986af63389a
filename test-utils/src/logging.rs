//! Logging for tests

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a fmt subscriber writing through the test harness
///
/// The level comes from `RUST_LOG` and falls back to `warn`. Safe to call from
/// every test; only the first call has an effect.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer().with_target(true))
            .try_init();
        tracing::debug!("test logging initialised");
    });
}
