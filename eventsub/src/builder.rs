//! Builder for creating and configuring an EventSubListener.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eventsub::{EventSubListenerBuilder, JsonFileStore, ReverseProxyAdapter};
//!
//! let listener = EventSubListenerBuilder::new(api, Arc::new(ReverseProxyAdapter::new("events.example.com")))
//!     .with_secret("a-long-shared-secret")
//!     .with_store(Arc::new(JsonFileStore::new("subscriptions.json")))
//!     .with_strict_host_check(true)
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use twitch_api::TwitchApiClient;

use crate::adapter::ConnectionAdapter;
use crate::config::ListenerConfig;
use crate::error::{EventSubError, Result};
use crate::listener::EventSubListener;
use crate::store::{MemoryStore, SubscriptionStore};

/// Fluent construction of an [`EventSubListener`].
///
/// `build()` fails with a configuration error when no secret was set or the
/// configuration does not validate.
pub struct EventSubListenerBuilder {
    api: TwitchApiClient,
    adapter: Arc<dyn ConnectionAdapter>,
    config: Option<ListenerConfig>,
    store: Arc<dyn SubscriptionStore>,
}

impl EventSubListenerBuilder {
    pub fn new(api: TwitchApiClient, adapter: Arc<dyn ConnectionAdapter>) -> Self {
        Self {
            api,
            adapter,
            config: None,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: ListenerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.config = Some(match self.config.take() {
            Some(mut config) => {
                config.secret = secret;
                config
            }
            None => ListenerConfig::new(secret),
        });
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SubscriptionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_strict_host_check(self, enabled: bool) -> Self {
        self.map_config(|c| c.with_strict_host_check(enabled))
    }

    pub fn with_handler_timeout(self, timeout: Duration) -> Self {
        self.map_config(|c| c.with_handler_timeout(timeout))
    }

    pub fn with_dedup_capacity(self, capacity: usize) -> Self {
        self.map_config(|c| c.with_dedup_capacity(capacity))
    }

    fn map_config(mut self, f: impl FnOnce(ListenerConfig) -> ListenerConfig) -> Self {
        let config = self.config.take().unwrap_or_else(|| ListenerConfig::new(String::new()));
        self.config = Some(f(config));
        self
    }

    pub fn build(self) -> Result<EventSubListener> {
        let config = self
            .config
            .ok_or_else(|| EventSubError::Configuration("A webhook secret is required".to_string()))?;
        EventSubListener::with_store(self.api, self.adapter, config, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ReverseProxyAdapter;
    use twitch_api::mock::MockHelixCaller;

    fn builder() -> EventSubListenerBuilder {
        EventSubListenerBuilder::new(
            TwitchApiClient::new(Arc::new(MockHelixCaller::new())),
            Arc::new(ReverseProxyAdapter::new("events.example.com")),
        )
    }

    #[test]
    fn test_build_requires_secret() {
        assert!(matches!(
            builder().build(),
            Err(EventSubError::Configuration(_))
        ));
        // Options set before the secret do not count as a secret.
        assert!(builder().with_strict_host_check(true).build().is_err());
    }

    #[test]
    fn test_options_survive_secret() {
        let listener = builder()
            .with_strict_host_check(true)
            .with_dedup_capacity(7)
            .with_secret("s3cretvalue")
            .build()
            .unwrap();

        assert!(listener.config().strict_host_check);
        assert_eq!(listener.config().dedup_capacity, 7);
        assert!(!listener.is_ready_to_subscribe());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = builder()
            .with_secret("s3cretvalue")
            .with_handler_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
