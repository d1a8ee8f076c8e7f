//! Helix endpoint methods for twitch-sdk
//!
//! This crate sits on top of the private `helix-client` crate and knows the
//! shape of the endpoints the rest of the SDK consumes: EventSub subscription
//! management and user lookup, plus the cursor pagination helper shared by
//! list endpoints.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use helix_client::{HelixClient, HelixClientConfig};
//! use twitch_api::TwitchApiClient;
//!
//! let caller = HelixClient::new(HelixClientConfig::new("client-id", "app-token"))?;
//! let api = TwitchApiClient::new(Arc::new(caller));
//!
//! let mut pages = api.eventsub().get_subscriptions_paginated();
//! let all = pages.get_all().await?;
//! ```

pub mod client;
pub mod error;
pub mod operations;
pub mod pagination;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use client::{EventSubApi, TwitchApiClient, UsersApi};
pub use error::{ApiError, Result};
pub use operations::eventsub::{
    EventSubTransportOptions, HelixEventSubSubscription, HelixEventSubSubscriptionStatus,
    HelixEventSubTransport,
};
pub use operations::users::HelixUser;
pub use pagination::HelixPaginatedRequest;

pub use helix_client::{ApiCallOptions, HelixCaller, HelixError, HttpMethod};
