//! Configuration for the EventSub listener
//!
//! `ListenerConfig` carries the shared webhook secret and the knobs that
//! bound per-subscription resources: the dedup window, the handler watchdog
//! and the accepted message age.

use std::time::Duration;

use crate::error::EventSubError;

/// Shortest secret the remote service accepts
pub const MIN_SECRET_LENGTH: usize = 10;

/// Longest secret the remote service accepts
pub const MAX_SECRET_LENGTH: usize = 100;

/// Configuration for the EventSubListener
#[derive(Clone)]
pub struct ListenerConfig {
    /// Shared secret used to sign every message of every subscription
    pub secret: String,

    /// Number of recently seen message ids remembered per subscription
    /// Default: 100
    pub dedup_capacity: usize,

    /// Handler runs longer than this are reported
    /// Default: 5 seconds
    pub handler_timeout: Duration,

    /// Messages with an older timestamp are rejected
    /// Default: 10 minutes
    pub max_message_age: Duration,

    /// Reject requests whose Host header differs from the adapter's host name
    /// Default: false
    pub strict_host_check: bool,

    /// Capacity of the lifecycle event broadcast channel
    /// Default: 64
    pub event_channel_capacity: usize,
}

impl std::fmt::Debug for ListenerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerConfig")
            .field("secret", &"<redacted>")
            .field("dedup_capacity", &self.dedup_capacity)
            .field("handler_timeout", &self.handler_timeout)
            .field("max_message_age", &self.max_message_age)
            .field("strict_host_check", &self.strict_host_check)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .finish()
    }
}

impl ListenerConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            dedup_capacity: 100,
            handler_timeout: Duration::from_secs(5),
            max_message_age: Duration::from_secs(600), // 10 minutes
            strict_host_check: false,
            event_channel_capacity: 64,
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), EventSubError> {
        let len = self.secret.len();
        if !(MIN_SECRET_LENGTH..=MAX_SECRET_LENGTH).contains(&len) {
            return Err(EventSubError::Configuration(format!(
                "Secret must be between {MIN_SECRET_LENGTH} and {MAX_SECRET_LENGTH} characters, got {len}"
            )));
        }

        if self.dedup_capacity == 0 {
            return Err(EventSubError::Configuration(
                "Dedup capacity must be greater than 0".to_string(),
            ));
        }

        if self.handler_timeout == Duration::ZERO {
            return Err(EventSubError::Configuration(
                "Handler timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_message_age == Duration::ZERO {
            return Err(EventSubError::Configuration(
                "Max message age must be greater than 0".to_string(),
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(EventSubError::Configuration(
                "Event channel capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_dedup_capacity(mut self, capacity: usize) -> Self {
        self.dedup_capacity = capacity;
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_max_message_age(mut self, age: Duration) -> Self {
        self.max_message_age = age;
        self
    }

    pub fn with_strict_host_check(mut self, enabled: bool) -> Self {
        self.strict_host_check = enabled;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ListenerConfig::new("s3cretvalue");
        assert_eq!(config.dedup_capacity, 100);
        assert_eq!(config.handler_timeout, Duration::from_secs(5));
        assert_eq!(config.max_message_age, Duration::from_secs(600));
        assert!(!config.strict_host_check);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_length_bounds() {
        assert!(ListenerConfig::new("short").validate().is_err());
        assert!(ListenerConfig::new("a".repeat(MIN_SECRET_LENGTH)).validate().is_ok());
        assert!(ListenerConfig::new("a".repeat(MAX_SECRET_LENGTH)).validate().is_ok());
        assert!(ListenerConfig::new("a".repeat(MAX_SECRET_LENGTH + 1)).validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = ListenerConfig::new("s3cretvalue").with_dedup_capacity(0);
        assert!(config.validate().is_err());

        let config = ListenerConfig::new("s3cretvalue").with_handler_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ListenerConfig::new("s3cretvalue")
            .with_dedup_capacity(10)
            .with_handler_timeout(Duration::from_millis(250))
            .with_max_message_age(Duration::from_secs(60))
            .with_strict_host_check(true)
            .with_event_channel_capacity(8);

        assert_eq!(config.dedup_capacity, 10);
        assert_eq!(config.handler_timeout, Duration::from_millis(250));
        assert!(config.strict_host_check);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", ListenerConfig::new("s3cretvalue"));
        assert!(!rendered.contains("s3cretvalue"));
    }
}
