//! Logging setup for applications embedding the EventSub listener.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Env var overriding the log filter, e.g. `eventsub=debug,warp=info`
pub const LOG_LEVEL_ENV: &str = "EVENTSUB_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Verbose output with source locations
    Debug,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter in {LOG_LEVEL_ENV}: {0}")]
    InvalidFilter(String),
}

/// Install a global tracing subscriber for `mode`.
///
/// `EVENTSUB_LOG_LEVEL` takes precedence over `RUST_LOG`, which takes
/// precedence over the mode's default level. Fails if a global subscriber
/// is already set.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .with(create_env_filter("info")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(create_env_filter("debug")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter(format!("{directives}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_installs_nothing() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_default_filter_is_valid() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("eventsub=debug,warp=warn").is_ok());
    }
}
