//! Tracing subscriber setup.
//!
//! apier logs through the `tracing` macros and never installs a subscriber
//! on its own. Call [`init`] once at startup to print events to stdout,
//! filtered by `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run --example basic
//! RUST_LOG=apier=debug,hyper=warn cargo run --example basic
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a formatted stdout subscriber. Defaults to `info` when
/// `RUST_LOG` is unset. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
