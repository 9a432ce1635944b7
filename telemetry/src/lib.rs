//! Tracing and metrics plumbing shared by every Shoply binary.
//!
//! Two entry points:
//!
//! - [`init_tracing`]: installs a `tracing-subscriber` fmt layer driven by
//!   `RUST_LOG` (defaults to `info`), optionally JSON-formatted via
//!   `LOG_FORMAT=json`. Safe to call more than once.
//! - [`MetricsServer`]: installs the Prometheus recorder and serves
//!   `GET /metrics` on a dedicated listener, so scrape traffic never mixes
//!   with service traffic.
//!
//! Domain metric names are registered in [`metrics::register_metrics`] so
//! every exported series carries a description, whichever service happens
//! to emit it first.

pub mod metrics;

pub use metrics::{MetricsError, MetricsServer};

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Reads `RUST_LOG` for filtering (default `info`) and `LOG_FORMAT` for the
/// output format (`json` for machine-readable logs, anything else for
/// human-readable). Subsequent calls are no-ops, so tests can call this
/// freely.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}
