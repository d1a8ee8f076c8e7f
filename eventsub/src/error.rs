//! Error types for the eventsub crate.

use twitch_api::ApiError;

/// Errors surfaced by the EventSub listener and its subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum EventSubError {
    /// The remote service rejected a subscribe or delete call
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The transport adapter could not provide its public address
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Persisted subscription state could not be read or written
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The listener behind a subscription has been dropped
    #[error("Listener for subscription {0} is gone")]
    ListenerGone(String),
}

/// Errors from transport adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The public host name could not be resolved
    #[error("Host name resolution failed: {0}")]
    HostResolution(String),

    /// TLS certificate material could not be loaded
    #[error("TLS material error: {0}")]
    Tls(String),
}

/// Errors from subscription stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons an inbound message fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature header is not of the form sha256=<hex>")]
    MalformedSignature,

    #[error("Signature does not match message")]
    Mismatch,

    #[error("Message timestamp could not be parsed: {0}")]
    InvalidTimestamp(String),

    #[error("Message timestamp {0} is outside the accepted window")]
    Stale(String),
}

/// Reasons a verification challenge is not answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("Subscription is {0}, not pending")]
    NotPending(crate::types::SubscriptionStatus),

    #[error("Challenge is for remote subscription {received}, expected {expected}")]
    ForeignId { expected: String, received: String },
}

/// Convenience type alias for Results using EventSubError.
pub type Result<T> = std::result::Result<T, EventSubError>;
