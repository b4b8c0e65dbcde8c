//! Structured logging with `tracing`.
//!
//! The chat log store reports persistence failures as `tracing` events rather
//! than through a bespoke logger object: the write path emits an `error!` with
//! `error` and `record` fields, and whatever subscriber the host installed
//! decides where that goes.
//!
//! - [`init_subscriber`] sets up a stderr subscriber honoring `RUST_LOG`
//! - [`capture_logs`] installs a thread-local capture layer for tests

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set and valid, `level` otherwise.
fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install a compact stderr subscriber as the global default.
///
/// `level` (e.g. `"warn"`) applies when `RUST_LOG` is unset. Only the first
/// call in a process takes effect.
pub fn init_subscriber(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Like [`init_subscriber`], with newline-delimited JSON output for hosts
/// that ship logs to a collector.
pub fn init_json_subscriber(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
