//! Subscription lifecycle
//!
//! A [`Subscription`] tracks one remote EventSub subscription from
//! registration through verification to suspension. Accepted notifications
//! are handed to a per-subscription worker task that invokes the user
//! handler on the blocking pool, one event at a time in arrival order.
//!
//! ```text
//! Pending ──challenge──> Verified ──suspend/revoke──> Suspended
//!    │
//!    └──registration rejected / verification failed──> Failed
//! ```

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use twitch_api::operations::eventsub::SubscribeRequest;
use twitch_api::{EventSubTransportOptions, TwitchApiClient};

use crate::error::{EventSubError, Result, VerificationError};
use crate::events::EventSubEvent;
use crate::kind::EventKind;
use crate::listener::{ListenerEvent, ListenerInner};
use crate::store::PersistedSubscription;
use crate::types::SubscriptionStatus;

/// User callback receiving the events of one subscription
pub type EventHandler = Arc<dyn Fn(EventSubEvent) + Send + Sync>;

/// What happened to an inbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Transformed and queued for the handler
    Accepted,
    /// Message id already seen; dropped
    Duplicate,
    /// Subscription is not verified; dropped
    NotVerified(SubscriptionStatus),
    /// Payload did not match the event schema; dropped
    Malformed(String),
}

struct SubscriptionState {
    status: SubscriptionStatus,
    remote_id: Option<String>,
}

struct Delivery {
    recent_ids: LruCache<String, ()>,
    sender: Option<mpsc::UnboundedSender<EventSubEvent>>,
}

/// One tracked EventSub subscription.
pub struct Subscription {
    kind: EventKind,
    key: String,
    state: Mutex<SubscriptionState>,
    delivery: Mutex<Delivery>,
    registration_started: AtomicBool,
    client: TwitchApiClient,
    listener: Weak<ListenerInner>,
}

impl Subscription {
    /// Create a pending subscription and start its handler worker.
    pub(crate) fn new(kind: EventKind, handler: EventHandler, listener: &Arc<ListenerInner>) -> Arc<Self> {
        let key = kind.key();
        let (sender, receiver) = mpsc::unbounded_channel();
        let capacity = NonZeroUsize::new(listener.config.dedup_capacity).unwrap_or(NonZeroUsize::MIN);

        tokio::spawn(run_handler_worker(
            key.clone(),
            handler,
            receiver,
            listener.config.handler_timeout,
        ));

        Arc::new(Self {
            kind,
            key,
            state: Mutex::new(SubscriptionState {
                status: SubscriptionStatus::Pending,
                remote_id: None,
            }),
            delivery: Mutex::new(Delivery {
                recent_ids: LruCache::new(capacity),
                sender: Some(sender),
            }),
            registration_started: AtomicBool::new(false),
            client: listener.api.clone(),
            listener: Arc::downgrade(listener),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.state.lock().status
    }

    pub fn is_verified(&self) -> bool {
        self.status() == SubscriptionStatus::Verified
    }

    /// Id assigned by the remote service, once known.
    pub fn remote_id(&self) -> Option<String> {
        self.state.lock().remote_id.clone()
    }

    fn listener(&self) -> Result<Arc<ListenerInner>> {
        self.listener
            .upgrade()
            .ok_or_else(|| EventSubError::ListenerGone(self.key.clone()))
    }

    /// Register this subscription with the remote service.
    ///
    /// On success the remote id is stored and the subscription waits for its
    /// challenge (unless the challenge already arrived). On failure it is
    /// marked `Failed` and the API error is returned unchanged. Only the
    /// first call registers; later calls return immediately.
    pub(crate) async fn register(&self) -> Result<()> {
        if self.registration_started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let listener = self.listener()?;
        let callback = listener.callback_url(&self.key).await?;

        let request = SubscribeRequest {
            subscription_type: self.kind.event_type().to_string(),
            version: self.kind.version().to_string(),
            condition: self.kind.condition(),
            transport: EventSubTransportOptions::webhook(callback, listener.config.secret.clone()),
            user_id: self.kind.authorizing_user().map(str::to_string),
            scopes: self.kind.scopes().iter().map(|s| s.to_string()).collect(),
        };

        match self.client.eventsub().create_subscription(&request).await {
            Ok(remote) => {
                let (still_active, bound_to) = {
                    let mut state = self.state.lock();
                    let bound_to = match &state.remote_id {
                        Some(existing) if *existing != remote.id => Some(existing.clone()),
                        _ => {
                            state.remote_id = Some(remote.id.clone());
                            None
                        }
                    };
                    (state.status.is_active(), bound_to)
                };

                if let Some(existing) = bound_to {
                    // Adopted during resumption while the create call was in flight.
                    tracing::info!(
                        key = %self.key,
                        remote_id = %existing,
                        duplicate = %remote.id,
                        "Subscription already bound; deleting the new remote subscription"
                    );
                    self.delete_remote(&listener, &remote.id).await;
                } else {
                    tracing::info!(key = %self.key, remote_id = %remote.id, "Subscription created");
                    listener.emit(ListenerEvent::SubscriptionCreateSuccess {
                        key: self.key.clone(),
                        remote_id: remote.id.clone(),
                    });
                    if !still_active {
                        // Suspended while the create call was in flight.
                        self.delete_remote(&listener, &remote.id).await;
                    }
                }
                listener.persist().await;
                Ok(())
            }
            Err(e) => {
                self.state.lock().status = SubscriptionStatus::Failed;
                self.close_worker();
                tracing::warn!(key = %self.key, error = %e, "Subscription create failed");
                listener.emit(ListenerEvent::SubscriptionCreateFailure {
                    key: self.key.clone(),
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Answer a verification challenge.
    ///
    /// Accepted only while pending. When both the challenge's remote id and
    /// the stored one are known they must match; if only the challenge's id
    /// is known it is adopted.
    pub(crate) fn handle_verification_challenge(
        &self,
        challenge: &str,
        remote_id: Option<&str>,
    ) -> std::result::Result<String, VerificationError> {
        let mut state = self.state.lock();
        if state.status != SubscriptionStatus::Pending {
            return Err(VerificationError::NotPending(state.status));
        }

        match (&state.remote_id, remote_id) {
            (Some(expected), Some(received)) if expected != received => {
                return Err(VerificationError::ForeignId {
                    expected: expected.clone(),
                    received: received.to_string(),
                });
            }
            (None, Some(received)) => state.remote_id = Some(received.to_string()),
            _ => {}
        }

        state.status = SubscriptionStatus::Verified;
        Ok(challenge.to_string())
    }

    /// Accept a notification payload for the handler.
    ///
    /// The dedup check and the enqueue happen under one lock, so handler
    /// order matches the arrival order of distinct message ids.
    pub(crate) fn handle_notification(&self, message_id: &str, raw_event: Value) -> NotificationOutcome {
        let status = self.status();
        if status != SubscriptionStatus::Verified {
            return NotificationOutcome::NotVerified(status);
        }

        let mut delivery = self.delivery.lock();
        if delivery.recent_ids.put(message_id.to_string(), ()).is_some() {
            return NotificationOutcome::Duplicate;
        }

        let event = match self.kind.transform(raw_event, self.client.clone()) {
            Ok(event) => event,
            Err(e) => return NotificationOutcome::Malformed(e.to_string()),
        };

        match &delivery.sender {
            Some(sender) if sender.send(event).is_ok() => NotificationOutcome::Accepted,
            _ => NotificationOutcome::NotVerified(self.status()),
        }
    }

    /// Stop this subscription.
    ///
    /// Removes it from the listener, deletes the remote subscription (best
    /// effort, failures are logged) and stops the handler worker once the
    /// events already accepted have been handled.
    pub async fn suspend(&self) {
        let (previous, remote_id) = {
            let mut state = self.state.lock();
            let previous = state.status;
            if previous.is_active() {
                state.status = SubscriptionStatus::Suspended;
            }
            (previous, state.remote_id.clone())
        };
        self.close_worker();

        let Some(listener) = self.listener.upgrade() else {
            return;
        };
        listener
            .subscriptions
            .remove_if(&self.key, |_, tracked| std::ptr::eq(Arc::as_ptr(tracked), self));

        if previous.is_active() {
            if let Some(remote_id) = remote_id {
                self.delete_remote(&listener, &remote_id).await;
            }
            tracing::info!(key = %self.key, "Subscription suspended");
        }
        listener.persist().await;
    }

    /// Mark the subscription revoked by the remote service. No remote call.
    pub(crate) fn mark_revoked(&self, status: SubscriptionStatus) {
        self.state.lock().status = status;
        self.close_worker();
    }

    /// Take over an existing remote subscription found during resumption.
    pub(crate) fn adopt(&self, remote_id: &str, verified: bool) {
        self.registration_started.store(true, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.remote_id = Some(remote_id.to_string());
        if verified && state.status == SubscriptionStatus::Pending {
            state.status = SubscriptionStatus::Verified;
        }
    }

    pub(crate) fn persisted(&self) -> PersistedSubscription {
        PersistedSubscription {
            key: self.key.clone(),
            remote_id: self.remote_id(),
            event_type: self.kind.event_type().to_string(),
            params: self.kind.condition(),
        }
    }

    async fn delete_remote(&self, listener: &ListenerInner, remote_id: &str) {
        match self.client.eventsub().delete_subscription(remote_id).await {
            Ok(()) => {
                tracing::debug!(key = %self.key, remote_id, "Remote subscription deleted");
                listener.emit(ListenerEvent::SubscriptionDeleteSuccess { key: self.key.clone() });
            }
            Err(e) => {
                tracing::warn!(key = %self.key, remote_id, error = %e, "Remote subscription delete failed");
                listener.emit(ListenerEvent::SubscriptionDeleteFailure {
                    key: self.key.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn close_worker(&self) {
        self.delivery.lock().sender = None;
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("status", &state.status)
            .field("remote_id", &state.remote_id)
            .finish()
    }
}

/// Invoke the handler for each queued event until the sender is dropped.
async fn run_handler_worker(
    key: String,
    handler: EventHandler,
    mut receiver: mpsc::UnboundedReceiver<EventSubEvent>,
    timeout: Duration,
) {
    while let Some(event) = receiver.recv().await {
        let handler = Arc::clone(&handler);
        let mut task = tokio::task::spawn_blocking(move || handler(event));

        let result = match tokio::time::timeout(timeout, &mut task).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    timeout_ms = timeout.as_millis() as u64,
                    "Event handler exceeded its timeout"
                );
                task.await
            }
        };

        if let Err(e) = result {
            if e.is_panic() {
                let panic = e.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(key = %key, panic = %message, "Event handler panicked");
            } else {
                tracing::error!(key = %key, error = %e, "Event handler task failed");
            }
        }
    }
    tracing::debug!(key = %key, "Handler worker stopped");
}
