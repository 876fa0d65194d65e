//! Tracing subscriber setup.

use std::io;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the built-in filter. JSON output is meant
/// for container log collectors; the compact format suits terminals. Calling
/// this more than once keeps the first subscriber.
pub fn init(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stdout);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
