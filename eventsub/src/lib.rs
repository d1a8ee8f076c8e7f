//! # eventsub
//!
//! EventSub webhook subscriptions for twitch-sdk.
//!
//! This crate manages the subscription lifecycle without owning an HTTP
//! server: it registers webhook subscriptions through the Helix API,
//! authenticates and deduplicates inbound messages, answers verification
//! challenges, turns notification payloads into typed events, and
//! reconciles its state with the remote service after a restart. The
//! `eventsub-http` crate binds it to a real server.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eventsub::{EventSubListener, ListenerConfig, ReverseProxyAdapter};
//!
//! let adapter = Arc::new(ReverseProxyAdapter::new("events.example.com").with_path_prefix("/hooks"));
//! let listener = EventSubListener::new(api, adapter, ListenerConfig::new("a-long-shared-secret"))?;
//!
//! listener
//!     .subscribe_to_channel_ban_events("1337", |event| {
//!         println!("{} was banned by {}", event.user_display_name(), event.moderator_display_name());
//!     })
//!     .await?;
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod kind;
pub mod listener;
pub mod signature;
pub mod store;
pub mod subscription;
pub mod types;

pub use adapter::{ConnectionAdapter, DirectConnectionAdapter, ReverseProxyAdapter, TlsMaterial};
pub use builder::EventSubListenerBuilder;
pub use config::ListenerConfig;
pub use error::{AdapterError, EventSubError, Result, SignatureError, StoreError, VerificationError};
pub use events::EventSubEvent;
pub use kind::{EventKind, RaidDirection};
pub use listener::{EventSubListener, ListenerEvent};
pub use store::{JsonFileStore, MemoryStore, PersistedSubscription, SubscriptionStore};
pub use subscription::{EventHandler, NotificationOutcome, Subscription};
pub use types::{DispatchResponse, EventSubHeaders, MessageType, SubscriptionStatus};
