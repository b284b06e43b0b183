//! Logging setup
//!
//! Diagnostics go to stderr so replies on stdout stay pipeable. `RUST_LOG`
//! wins over the `-v` count when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Default filter directives for a given `-v` count
pub fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "evolv=info,evolv_agent=info",
        1 => "evolv=debug,evolv_agent=debug",
        _ => "evolv=trace,evolv_agent=trace,reqwest=debug",
    }
}

/// Initialize the global subscriber
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbosity)))
        .map_err(|e| anyhow!("Invalid log filter: {}", e))?;

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbosity > 0)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
