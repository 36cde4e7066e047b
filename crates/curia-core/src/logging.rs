//! Logging integration for curia.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-statement spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "curia_db=trace"); an unparseable filter falls back to "info". In debug
/// mode a pretty, human-readable format is used; otherwise structured JSON.
///
/// Calling this more than once is harmless: if a subscriber is already
/// installed the call does nothing.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one statement sent through a connection.
///
/// Execution adapters enter this span around each round trip so that driver
/// errors and timings are attributed to the connection that ran them.
///
/// # Examples
///
/// ```
/// use curia_core::logging::query_span;
///
/// let span = query_span("default", "select");
/// let _guard = span.enter();
/// tracing::debug!(sql = "select * from `users`", "running statement");
/// ```
pub fn query_span(connection: &str, kind: &str) -> tracing::Span {
    tracing::debug_span!("query", connection = connection, kind = kind)
}
