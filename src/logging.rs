//! Diagnostic tracing for the search binary.
//!
//! Search results go to stdout; everything here goes to stderr, filtered by
//! `RUST_LOG` (default `warn`). Per-move events are at `trace` level:
//!
//! ```bash
//! RUST_LOG=qvik=trace qvik run --main f1 --sub1 forward,left,f2 --sub2 forward,right,f1
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, before any work.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
