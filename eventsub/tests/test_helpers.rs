//! Shared fixtures for listener tests.

#![allow(dead_code)]

use std::sync::Arc;

use eventsub::signature::compute_signature;
use eventsub::{EventSubHeaders, EventSubListener, ListenerConfig, ReverseProxyAdapter};
use serde_json::{json, Value};
use twitch_api::mock::MockHelixCaller;
use twitch_api::TwitchApiClient;

pub const SECRET: &str = "s3cretvalue-for-tests";
pub const HOST: &str = "events.example.com";
pub const CALLBACK_BASE: &str = "https://events.example.com/hooks/event/";

pub fn test_config() -> ListenerConfig {
    ListenerConfig::new(SECRET)
}

/// Listener behind a reverse proxy with prefix `/hooks`, backed by a mock API.
pub fn create_listener(config: ListenerConfig) -> (EventSubListener, Arc<MockHelixCaller>) {
    let mock = Arc::new(MockHelixCaller::new());
    let listener = create_listener_with(Arc::clone(&mock), config);
    (listener, mock)
}

pub fn create_listener_with(mock: Arc<MockHelixCaller>, config: ListenerConfig) -> EventSubListener {
    let adapter = ReverseProxyAdapter::new(HOST).with_path_prefix("/hooks");
    EventSubListener::new(TwitchApiClient::new(mock), Arc::new(adapter), config)
        .expect("valid listener config")
}

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Headers signed with the test secret.
pub fn signed_headers(message_type: &str, message_id: &str, timestamp: &str, body: &[u8]) -> EventSubHeaders {
    EventSubHeaders {
        message_id: Some(message_id.to_string()),
        message_type: Some(message_type.to_string()),
        timestamp: Some(timestamp.to_string()),
        signature: Some(compute_signature(SECRET, message_id, timestamp, body)),
    }
}

pub fn verification_body(challenge: &str, remote_id: Option<&str>) -> Vec<u8> {
    let subscription = match remote_id {
        Some(id) => json!({ "id": id, "status": "webhook_callback_verification_pending" }),
        None => json!({ "status": "webhook_callback_verification_pending" }),
    };
    serde_json::to_vec(&json!({ "challenge": challenge, "subscription": subscription })).unwrap()
}

pub fn ban_event(user_id: &str, broadcaster_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "user_login": "cool_user",
        "user_name": "Cool_User",
        "broadcaster_user_id": broadcaster_id,
        "broadcaster_user_login": "cooler_user",
        "broadcaster_user_name": "Cooler_User",
        "moderator_user_id": "1339",
        "moderator_user_login": "mod_user",
        "moderator_user_name": "Mod_User",
        "reason": "Offensive language",
        "banned_at": "2020-07-15T18:15:11.17106713Z",
        "ends_at": null,
        "is_permanent": true
    })
}

pub fn notification_body(event: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({ "subscription": { "status": "enabled" }, "event": event })).unwrap()
}

/// Answer the challenge for `key` so the subscription becomes verified.
pub async fn verify(listener: &EventSubListener, key: &str) {
    let remote_id = listener.subscription(key).and_then(|s| s.remote_id());
    let body = verification_body("challenge", remote_id.as_deref());
    let headers = signed_headers("webhook_callback_verification", &format!("verify-{key}"), &now(), &body);
    let response = listener.handle_request(key, &headers, &body).await;
    assert_eq!(response.status, 200, "verification of {key} failed");
}
