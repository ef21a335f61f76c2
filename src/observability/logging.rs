//! Structured logging initialization.
//!
//! The engine logs about itself through `tracing`; the embedding
//! application owns the subscriber. This helper builds a reasonable one
//! for binaries and examples that have no subscriber of their own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a fmt subscriber with an env-filter, falling back to the
/// given default directive when `RUST_LOG` is unset.
///
/// Call once from the embedding binary's entry point, before the engine
/// starts. The library itself never installs a subscriber.
pub fn init_logging(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
