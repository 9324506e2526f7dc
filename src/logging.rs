//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with completion text on stdout.

use tracing_subscriber::EnvFilter;

/// Default filter when `--verbose` is not given.
const QUIET_FILTER: &str = "warn";

/// Default filter with `--verbose`.
const VERBOSE_FILTER: &str = "warn,nuro=debug";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        VERBOSE_FILTER
    } else {
        QUIET_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second init (e.g. from tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
