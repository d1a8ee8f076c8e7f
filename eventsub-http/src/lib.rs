//! HTTP front-end for EventSub webhooks.
//!
//! [`EventSubHttpListener`] runs a warp server in front of an
//! [`eventsub::EventSubListener`]. The server answers health checks, rejects
//! the legacy callback path and hands every `POST {prefix}/event/{key}`
//! request to the listener, which verifies, deduplicates and dispatches it.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eventsub::{EventSubListenerBuilder, ReverseProxyAdapter};
//! use eventsub_http::{init_logging, EventSubHttpListener, LoggingMode};
//!
//! init_logging(LoggingMode::Development)?;
//!
//! let adapter = ReverseProxyAdapter::new("events.example.com").with_path_prefix("/hooks");
//! let listener = EventSubListenerBuilder::new(api, Arc::new(adapter))
//!     .with_secret("a-long-shared-secret")
//!     .build()?;
//!
//! listener
//!     .subscribe_to_stream_offline_events("1337", |event| {
//!         println!("{} went offline", event.broadcaster_display_name());
//!     })
//!     .await?;
//!
//! let server = EventSubHttpListener::new(listener);
//! server.start().await?;
//! println!("listening on {}", server.ready().await?);
//! ```

pub mod error;
pub mod logging;
pub mod router;
mod server;

pub use error::{HttpListenerError, Result};
pub use logging::{init_logging, LoggingError, LoggingMode};
pub use server::EventSubHttpListener;
