//! Diagnostic logging setup.
//!
//! Reads the `GOVGATE_LOG` environment variable for filter directives, e.g.
//! `GOVGATE_LOG=govgate::engine=debug,govgate::rules=trace`. Logs always go to
//! stderr so stdout stays clean for summaries and JSON.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GOVGATE_LOG";

static INIT: Once = Once::new();

/// Default filter when `GOVGATE_LOG` is unset or invalid.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "govgate=debug"
    } else {
        "warn"
    }
}

/// Initialize the tracing subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .without_time(),
            )
            .with(filter)
            .init();
    });
}
