//! Tracing initialization for plugin scripts.
//!
//! asdf reads `list-all` output from stdout, so logs always go to stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{DEFAULT_LOG_FILTER, LOG_ENV, LOG_FORMAT_ENV};

/// Initialize logging to stderr.
///
/// Reads filter directives from `ASDF_PLUGIN_LOG`, e.g.
/// `ASDF_PLUGIN_LOG=asdf_plugin_kit=debug`, falling back to
/// `asdf_plugin_kit=info`. `ASDF_PLUGIN_LOG_FORMAT=json` emits JSON lines.
///
/// Keep the returned guard alive until exit, dropping it flushes pending
/// lines. Calling this again after a subscriber is set is a no-op.
pub fn init_logging() -> WorkerGuard {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = log_format_is_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let layer = fmt::layer().with_writer(writer).with_target(false);
    let result = if json {
        tracing_subscriber::registry()
            .with(layer.json())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }

    guard
}

fn log_format_is_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}
