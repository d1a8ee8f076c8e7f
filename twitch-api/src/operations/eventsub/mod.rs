//! EventSub subscription management operations
//!
//! These operations register, list, and delete EventSub subscriptions. The
//! webhook transport carries the callback URL the remote service will POST
//! notifications to, and the secret it signs them with.

pub mod delete;
pub mod list;
pub mod subscribe;

pub use delete::{DeleteSubscriptionOperation, DeleteSubscriptionRequest};
pub use list::{ListSubscriptionsFilter, ListSubscriptionsOperation};
pub use subscribe::{SubscribeOperation, SubscribeRequest};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const SUBSCRIPTIONS_PATH: &str = "eventsub/subscriptions";

/// Transport options sent when creating a webhook subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSubTransportOptions {
    pub method: String,
    pub callback: String,
    pub secret: String,
}

impl EventSubTransportOptions {
    pub fn webhook(callback: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            method: "webhook".to_string(),
            callback: callback.into(),
            secret: secret.into(),
        }
    }
}

/// Transport of an existing subscription, as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HelixEventSubTransport {
    pub method: String,
    #[serde(default)]
    pub callback: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Status of a remote EventSub subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelixEventSubSubscriptionStatus {
    Enabled,
    WebhookCallbackVerificationPending,
    WebhookCallbackVerificationFailed,
    NotificationFailuresExceeded,
    AuthorizationRevoked,
    ModeratorRemoved,
    UserRemoved,
    VersionRemoved,
    Other(String),
}

impl HelixEventSubSubscriptionStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "enabled" => Self::Enabled,
            "webhook_callback_verification_pending" => Self::WebhookCallbackVerificationPending,
            "webhook_callback_verification_failed" => Self::WebhookCallbackVerificationFailed,
            "notification_failures_exceeded" => Self::NotificationFailuresExceeded,
            "authorization_revoked" => Self::AuthorizationRevoked,
            "moderator_removed" => Self::ModeratorRemoved,
            "user_removed" => Self::UserRemoved,
            "version_removed" => Self::VersionRemoved,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A remote EventSub subscription
#[derive(Debug, Clone, Deserialize)]
pub struct HelixEventSubSubscription {
    pub id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub subscription_type: String,
    pub version: String,
    pub condition: Value,
    pub created_at: String,
    pub transport: HelixEventSubTransport,
    #[serde(default)]
    pub cost: u32,
}

impl HelixEventSubSubscription {
    pub fn status(&self) -> HelixEventSubSubscriptionStatus {
        HelixEventSubSubscriptionStatus::from_api(&self.status)
    }

    /// Webhook callback URL, if this subscription uses the webhook transport.
    pub fn webhook_callback(&self) -> Option<&str> {
        if self.transport.method == "webhook" {
            self.transport.callback.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_subscription_deserialization() {
        let sub: HelixEventSubSubscription = serde_json::from_value(json!({
            "id": "f1c2a387-161a-49f9-a165-0f21d7a4e1c4",
            "status": "webhook_callback_verification_pending",
            "type": "channel.ban",
            "version": "1",
            "condition": { "broadcaster_user_id": "1337" },
            "created_at": "2019-11-16T10:11:12.634234626Z",
            "transport": { "method": "webhook", "callback": "https://example.com/event/channel.ban.1337" },
            "cost": 1
        }))
        .unwrap();

        assert_eq!(sub.subscription_type, "channel.ban");
        assert_eq!(
            sub.status(),
            HelixEventSubSubscriptionStatus::WebhookCallbackVerificationPending
        );
        assert_eq!(
            sub.webhook_callback(),
            Some("https://example.com/event/channel.ban.1337")
        );
    }

    #[test]
    fn test_websocket_transport_has_no_callback() {
        let sub: HelixEventSubSubscription = serde_json::from_value(json!({
            "id": "abc",
            "status": "enabled",
            "type": "user.update",
            "version": "1",
            "condition": { "user_id": "1" },
            "created_at": "2019-11-16T10:11:12Z",
            "transport": { "method": "websocket", "session_id": "s-1" }
        }))
        .unwrap();

        assert_eq!(sub.status(), HelixEventSubSubscriptionStatus::Enabled);
        assert!(sub.webhook_callback().is_none());
        assert_eq!(sub.cost, 0);
    }

    #[rstest]
    #[case("enabled", HelixEventSubSubscriptionStatus::Enabled)]
    #[case("authorization_revoked", HelixEventSubSubscriptionStatus::AuthorizationRevoked)]
    #[case("user_removed", HelixEventSubSubscriptionStatus::UserRemoved)]
    #[case(
        "notification_failures_exceeded",
        HelixEventSubSubscriptionStatus::NotificationFailuresExceeded
    )]
    fn test_status_from_api(#[case] raw: &str, #[case] expected: HelixEventSubSubscriptionStatus) {
        assert_eq!(HelixEventSubSubscriptionStatus::from_api(raw), expected);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        assert_eq!(
            HelixEventSubSubscriptionStatus::from_api("beta_maintenance"),
            HelixEventSubSubscriptionStatus::Other("beta_maintenance".to_string())
        );
    }

    #[test]
    fn test_webhook_transport_serialization() {
        let transport = EventSubTransportOptions::webhook("https://example.com/event/x", "s3cretvalue");
        assert_eq!(
            serde_json::to_value(&transport).unwrap(),
            json!({ "method": "webhook", "callback": "https://example.com/event/x", "secret": "s3cretvalue" })
        );
    }
}
