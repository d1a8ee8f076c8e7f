//! Shared protocol types for the eventsub crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Header carrying the unique message id
pub const HEADER_MESSAGE_ID: &str = "twitch-eventsub-message-id";
/// Header carrying the message type
pub const HEADER_MESSAGE_TYPE: &str = "twitch-eventsub-message-type";
/// Header carrying the RFC 3339 send timestamp
pub const HEADER_MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
/// Header carrying `sha256=<hex>` of the HMAC over id, timestamp and body
pub const HEADER_MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";

/// Local lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// Waiting for registration or for the verification challenge
    Pending,
    /// Challenge answered; notifications are delivered
    Verified,
    /// Stopped locally or revoked by the remote service
    Suspended,
    /// Registration rejected or verification failed remotely
    Failed,
}

impl SubscriptionStatus {
    /// Whether this subscription still counts as the live entry for its key
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Verified)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Suspended => "suspended",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Type of an inbound EventSub message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    Verification,
    Notification,
    Revocation,
    Unknown(String),
}

impl MessageType {
    pub fn from_header(value: &str) -> Self {
        match value {
            "webhook_callback_verification" => Self::Verification,
            "notification" => Self::Notification,
            "revocation" => Self::Revocation,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// The four EventSub headers of an inbound request, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSubHeaders {
    pub message_id: Option<String>,
    pub message_type: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl EventSubHeaders {
    /// Collect the headers through a case-insensitive lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            message_id: lookup(HEADER_MESSAGE_ID),
            message_type: lookup(HEADER_MESSAGE_TYPE),
            timestamp: lookup(HEADER_MESSAGE_TIMESTAMP),
            signature: lookup(HEADER_MESSAGE_SIGNATURE),
        }
    }
}

/// Response the HTTP layer should send for a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    /// Plain text body; only set for verification challenges
    pub body: Option<String>,
}

impl DispatchResponse {
    pub fn ok() -> Self {
        Self { status: 200, body: None }
    }

    pub fn challenge(challenge: String) -> Self {
        Self { status: 200, body: Some(challenge) }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }
}
