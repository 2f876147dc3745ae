//! Process-wide logging setup
//!
//! `init_logging` must run once at process start, before any environment,
//! network or agent is built.

use anyhow::{Result, anyhow};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

/// Install the global `tracing` subscriber
///
/// Fails if a subscriber has already been installed.
pub fn init_logging(level: Level) -> Result<()> {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::filter::LevelFilter::from_level(level));

    registry
        .try_init()
        .map_err(|e| anyhow!("failed to install logging subscriber: {e}"))?;

    info!("Logging initialized at level: {}", level);
    Ok(())
}

/// Map a `-v` count to a log level, starting at INFO
pub fn level_from_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0), Level::INFO);
        assert_eq!(level_from_verbosity(1), Level::DEBUG);
        assert_eq!(level_from_verbosity(5), Level::TRACE);
    }
}
