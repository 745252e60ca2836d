/*!
 * Tracing Setup
 * Installs a tracing-subscriber registry for the events arenas and pools emit
 *
 * Pools log misses, discards and drains at `debug`; lease/release at `trace`.
 * The allocation hot path emits nothing.
 */

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    EnvFilter,
};

/// Set to `1` or `true` for JSON log lines
pub const ENV_TRACE_JSON: &str = "CATENA_TRACE_JSON";

/// Initialize structured tracing
///
/// A no-op when a global subscriber is already installed; the existing one keeps
/// receiving events and the refusal is logged to it at `debug`.
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CATENA_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    if let Err(err) = try_init_tracing() {
        debug!(error = %err, "Tracing subscriber already installed, keeping it");
    }
}

/// Initialize structured tracing, failing if a global subscriber already exists
pub fn try_init_tracing() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()?;
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
        info!("Structured tracing initialized");
    }
    Ok(())
}
