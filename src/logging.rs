//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events. Binaries and embedders call
//! [`init_tracing`] once with an explicit filter; the filter is never read from
//! the environment.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Default filter when none (or an invalid one) is given
pub const DEFAULT_FILTER: &str = "moment_engine=info";

/// Install a stderr `fmt` subscriber filtered by `filter`.
///
/// `filter` uses `EnvFilter` directive syntax (`"debug"`,
/// `"moment_engine=trace"`). Safe to call more than once; only the first call
/// has an effect, and a subscriber installed elsewhere is left in place.
pub fn init_tracing(filter: &str) {
    INIT.call_once(|| {
        let filter = parse_filter(filter);
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn parse_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
