//! Diagnostic tracing for scribe.
//!
//! Model output goes to stdout; diagnostics go to stderr so the two never
//! interleave in a captured commit message or review.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset and `--verbose` is off.
pub const DEFAULT_FILTER: &str = "warn";
/// Filter used when `RUST_LOG` is unset and `--verbose` is on.
pub const VERBOSE_FILTER: &str = "warn,scribe=debug";

/// Pick the fallback filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `verbose`. Output: stderr, compact format; targets
/// are shown only in verbose mode.
///
/// # Example
/// ```bash
/// RUST_LOG=scribe::session=debug scribe commit .
/// ```
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .try_init()
        .map_err(|err| anyhow!("install tracing subscriber: {err}"))
}
