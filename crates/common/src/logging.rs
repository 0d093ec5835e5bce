//! Logging setup and configuration

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level names accepted by [`setup_logging`] and the configuration file
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a level name against [`LOG_LEVELS`]
pub fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level)
}

/// Setup tracing subscriber for the application
///
/// `RUST_LOG` takes precedence over `default_level`. Events go to stderr so
/// that stdout only carries command output.
pub fn setup_logging(default_level: &str) -> crate::Result<()> {
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| crate::Error::LoggingInit(e.to_string()))?;

    tracing::debug!(
        "Logging initialized (default level: {}, RUST_LOG set: {})",
        default_level,
        from_env
    );
    Ok(())
}
