//! Logging and tracing infrastructure for Lancelot.
//!
//! This module provides structured logging using the tracing crate,
//! with support for plain and JSON output and `RUST_LOG` filtering.

use std::sync::Once;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber.
///
/// This should be called once at program startup.
/// Subsequent calls are ignored.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initialize tracing with an explicit default level, used when `RUST_LOG` is unset.
pub fn init_tracing_with_level(default_level: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);

        // try_init: a host process may already own the global subscriber
        let _ = tracing_subscriber::registry()
            .with(env_filter(default_level))
            .with(fmt_layer)
            .try_init();

        info!("lancelot tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json(default_level: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_writer(std::io::stderr);

        let _ = tracing_subscriber::registry()
            .with(env_filter(default_level))
            .with(fmt_layer)
            .try_init();

        info!("lancelot tracing initialized (JSON mode)");
    });
}
