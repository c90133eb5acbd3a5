//! Logging initialization.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Pick the log level from the `--debug` / `--silent` flags
#[must_use]
pub fn level_for(debug: bool, silent: bool) -> Level {
    if debug {
        Level::DEBUG
    } else if silent {
        Level::ERROR
    } else {
        Level::INFO
    }
}

/// Initialize the global subscriber.
///
/// Logs are written to stderr so stdout remains clean. `RUST_LOG`, when set,
/// takes precedence over `level`.
pub fn init_logging(level: Level) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
