//! Process logging for the waybill service.
//!
//! One JSON object per event on stdout. Request handlers log resolve and
//! render failures (`warn` for not-found and invalid input, `error` for
//! storage), the renderer warns when it falls back to the built-in font, and
//! store queries run inside `#[instrument]` spans that `RUST_LOG` can raise to
//! `debug`. The audit trail is separate and always written; see
//! [`crate::audit`].

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Directives from `RUST_LOG`, or [`DEFAULT_FILTER`] when absent or unparsable.
pub(crate) fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the JSON subscriber. Later calls are no-ops.
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(directives.as_deref()))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
