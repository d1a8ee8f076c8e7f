//! EventSub listener core
//!
//! [`EventSubListener`] owns the map of tracked subscriptions, authenticates
//! and dispatches inbound webhook requests, and reconciles local state with
//! the remote service when the HTTP front-end comes up.
//!
//! The listener is transport agnostic: the HTTP layer extracts the
//! subscription key from the path and the EventSub headers, hands them to
//! [`EventSubListener::handle_request`] and writes back the returned
//! [`DispatchResponse`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex as AsyncMutex, OnceCell};
use twitch_api::{HelixEventSubSubscriptionStatus, TwitchApiClient};
use url::Url;

use crate::adapter::ConnectionAdapter;
use crate::config::ListenerConfig;
use crate::error::{AdapterError, Result};
use crate::events::{
    ChannelBanEvent, ChannelRaidEvent, ChannelRedemptionAddEvent, ChannelSubscriptionEvent,
    CharityCampaignProgressEvent, EventSubEvent, StreamOfflineEvent, UserAuthorizationRevokeEvent,
    UserUpdateEvent,
};
use crate::kind::{EventKind, RaidDirection};
use crate::signature::{check_freshness, verify_signature};
use crate::store::{MemoryStore, SubscriptionStore};
use crate::subscription::{EventHandler, NotificationOutcome, Subscription};
use crate::types::{DispatchResponse, EventSubHeaders, MessageType, SubscriptionStatus};

/// Lifecycle notifications published by the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    SubscriptionCreateSuccess { key: String, remote_id: String },
    SubscriptionCreateFailure { key: String, error: String },
    VerifySuccess { key: String },
    VerifyFailure { key: String, reason: String },
    SubscriptionDeleteSuccess { key: String },
    SubscriptionDeleteFailure { key: String, error: String },
    Revoked { key: String, status: String },
}

/// State shared by the listener handle and every subscription it tracks.
pub(crate) struct ListenerInner {
    pub(crate) api: TwitchApiClient,
    pub(crate) adapter: Arc<dyn ConnectionAdapter>,
    pub(crate) config: ListenerConfig,
    pub(crate) subscriptions: DashMap<String, Arc<Subscription>>,
    ready_to_subscribe: AtomicBool,
    store: Arc<dyn SubscriptionStore>,
    /// Set once resumption has read the store; writes before that would
    /// drop the remote ids of an earlier run.
    store_loaded: AtomicBool,
    /// Held from snapshot to save so an older snapshot never lands last.
    persist_lock: AsyncMutex<()>,
    events: broadcast::Sender<ListenerEvent>,
    host_name: OnceCell<String>,
}

impl ListenerInner {
    pub(crate) fn emit(&self, event: ListenerEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    async fn resolved_host_name(&self) -> std::result::Result<&str, AdapterError> {
        self.host_name
            .get_or_try_init(|| self.adapter.host_name())
            .await
            .map(String::as_str)
    }

    /// Base of every callback URL, e.g. `https://example.com/hooks/event/`.
    async fn callback_base(&self) -> std::result::Result<Url, AdapterError> {
        let host = self.resolved_host_name().await?;
        let port = self.adapter.external_port().await;

        let mut url = Url::parse(&format!("https://{host}"))
            .map_err(|e| AdapterError::HostResolution(format!("invalid host name {host}: {e}")))?;
        url.set_port(Some(port))
            .map_err(|_| AdapterError::HostResolution(format!("cannot set port on {host}")))?;
        let path = match self.adapter.path_prefix() {
            Some(prefix) => format!("/{prefix}/event/"),
            None => "/event/".to_string(),
        };
        url.set_path(&path);
        Ok(url)
    }

    pub(crate) async fn callback_url(&self, key: &str) -> std::result::Result<String, AdapterError> {
        let base = self.callback_base().await?;
        Ok(format!("{base}{key}"))
    }

    /// Write the tracked subscriptions to the store; failures are logged.
    pub(crate) async fn persist(&self) {
        if !self.store_loaded.load(Ordering::SeqCst) {
            return;
        }
        let _guard = self.persist_lock.lock().await;
        let mut entries: Vec<_> = self
            .subscriptions
            .iter()
            .map(|entry| entry.value().persisted())
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        if let Err(e) = self.store.save(&entries).await {
            tracing::warn!(error = %e, "Failed to persist subscription state");
        }
    }
}

/// Extract the subscription key from a callback URL under `base`.
fn key_from_callback(base: &Url, callback: &str) -> Option<String> {
    let url = Url::parse(callback).ok()?;
    let same_host = match (url.host_str(), base.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };
    if !same_host || url.port_or_known_default() != base.port_or_known_default() {
        return None;
    }
    let key = url.path().strip_prefix(base.path())?;
    (!key.is_empty() && !key.contains('/')).then(|| key.to_string())
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}

/// Core of an EventSub webhook listener.
///
/// Cheap to clone; clones share the same subscriptions.
#[derive(Clone)]
pub struct EventSubListener {
    inner: Arc<ListenerInner>,
}

impl EventSubListener {
    /// Create a listener with an in-memory subscription store.
    pub fn new(
        api: TwitchApiClient,
        adapter: Arc<dyn ConnectionAdapter>,
        config: ListenerConfig,
    ) -> Result<Self> {
        Self::with_store(api, adapter, config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(
        api: TwitchApiClient,
        adapter: Arc<dyn ConnectionAdapter>,
        config: ListenerConfig,
        store: Arc<dyn SubscriptionStore>,
    ) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            inner: Arc::new(ListenerInner {
                api,
                adapter,
                config,
                subscriptions: DashMap::new(),
                ready_to_subscribe: AtomicBool::new(false),
                store,
                store_loaded: AtomicBool::new(false),
                persist_lock: AsyncMutex::new(()),
                events,
                host_name: OnceCell::new(),
            }),
        })
    }

    pub fn adapter(&self) -> &Arc<dyn ConnectionAdapter> {
        &self.inner.adapter
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &TwitchApiClient {
        &self.inner.api
    }

    /// Receive lifecycle notifications from now on.
    pub fn events(&self) -> broadcast::Receiver<ListenerEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_ready_to_subscribe(&self) -> bool {
        self.inner.ready_to_subscribe.load(Ordering::SeqCst)
    }

    /// Set by the HTTP front-end once it is (or stops) listening.
    pub fn set_ready_to_subscribe(&self, ready: bool) {
        self.inner.ready_to_subscribe.store(ready, Ordering::SeqCst);
    }

    pub fn subscription(&self, key: &str) -> Option<Arc<Subscription>> {
        self.inner.subscriptions.get(key).map(|s| Arc::clone(s.value()))
    }

    pub fn subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.inner
            .subscriptions
            .iter()
            .map(|s| Arc::clone(s.value()))
            .collect()
    }

    /// Callback URL the remote service is given for `key`.
    pub async fn callback_url(&self, key: &str) -> Result<String> {
        Ok(self.inner.callback_url(key).await?)
    }

    /// Track a subscription for `kind`.
    ///
    /// If a pending or verified subscription with the same key exists it is
    /// returned as is and `handler` is dropped. When the listener is ready the
    /// remote registration is awaited and its error returned; otherwise the
    /// subscription is registered during resumption.
    pub async fn subscribe(&self, kind: EventKind, handler: EventHandler) -> Result<Arc<Subscription>> {
        let key = kind.key();
        let subscription = match self.inner.subscriptions.entry(key.clone()) {
            Entry::Occupied(entry) if entry.get().status().is_active() => {
                tracing::debug!(key = %key, "Subscription already tracked");
                return Ok(Arc::clone(entry.get()));
            }
            Entry::Occupied(mut entry) => {
                let subscription = Subscription::new(kind, handler, &self.inner);
                entry.insert(Arc::clone(&subscription));
                subscription
            }
            Entry::Vacant(entry) => {
                let subscription = Subscription::new(kind, handler, &self.inner);
                entry.insert(Arc::clone(&subscription));
                subscription
            }
        };

        if self.is_ready_to_subscribe() {
            if let Err(e) = subscription.register().await {
                self.inner
                    .subscriptions
                    .remove_if(&key, |_, tracked| Arc::ptr_eq(tracked, &subscription));
                return Err(e);
            }
        } else {
            tracing::debug!(key = %key, "Listener not ready; subscription will register on start");
        }

        Ok(subscription)
    }

    pub async fn subscribe_to_channel_ban_events<F>(&self, user_id: &str, handler: F) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelBanEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::ChannelBan { user_id: user_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::ChannelBan(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    pub async fn subscribe_to_user_update_events<F>(&self, user_id: &str, handler: F) -> Result<Arc<Subscription>>
    where
        F: Fn(UserUpdateEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::UserUpdate { user_id: user_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::UserUpdate(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    pub async fn subscribe_to_stream_offline_events<F>(&self, user_id: &str, handler: F) -> Result<Arc<Subscription>>
    where
        F: Fn(StreamOfflineEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::StreamOffline { user_id: user_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::StreamOffline(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    /// Raids started by `user_id`.
    pub async fn subscribe_to_channel_raid_events_from<F>(&self, user_id: &str, handler: F) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelRaidEvent) + Send + Sync + 'static,
    {
        self.subscribe_to_channel_raid_events(user_id, RaidDirection::From, handler).await
    }

    /// Raids targeting `user_id`.
    pub async fn subscribe_to_channel_raid_events_to<F>(&self, user_id: &str, handler: F) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelRaidEvent) + Send + Sync + 'static,
    {
        self.subscribe_to_channel_raid_events(user_id, RaidDirection::To, handler).await
    }

    async fn subscribe_to_channel_raid_events<F>(
        &self,
        user_id: &str,
        direction: RaidDirection,
        handler: F,
    ) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelRaidEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::ChannelRaid { user_id: user_id.to_string(), direction };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::ChannelRaid(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    pub async fn subscribe_to_channel_subscription_events<F>(
        &self,
        user_id: &str,
        handler: F,
    ) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelSubscriptionEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::ChannelSubscription { user_id: user_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::ChannelSubscription(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    /// Redemptions of any custom reward, or of one reward when `reward_id` is given.
    pub async fn subscribe_to_channel_redemption_add_events<F>(
        &self,
        user_id: &str,
        reward_id: Option<&str>,
        handler: F,
    ) -> Result<Arc<Subscription>>
    where
        F: Fn(ChannelRedemptionAddEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::ChannelRedemptionAdd {
            user_id: user_id.to_string(),
            reward_id: reward_id.map(str::to_string),
        };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::ChannelRedemptionAdd(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    /// Authorization revocations for the application `client_id`.
    pub async fn subscribe_to_user_authorization_revoke_events<F>(
        &self,
        client_id: &str,
        handler: F,
    ) -> Result<Arc<Subscription>>
    where
        F: Fn(UserAuthorizationRevokeEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::UserAuthorizationRevoke { client_id: client_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::UserAuthorizationRevoke(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    pub async fn subscribe_to_charity_campaign_progress_events<F>(
        &self,
        user_id: &str,
        handler: F,
    ) -> Result<Arc<Subscription>>
    where
        F: Fn(CharityCampaignProgressEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::CharityCampaignProgress { user_id: user_id.to_string() };
        self.subscribe(
            kind,
            Arc::new(move |event| {
                if let EventSubEvent::CharityCampaignProgress(event) = event {
                    handler(event)
                }
            }),
        )
        .await
    }

    /// Whether a request with this Host header should be rejected.
    ///
    /// Always false unless strict host checking is enabled. The port is
    /// ignored and names compare case-insensitively.
    pub async fn is_host_denied(&self, host_header: Option<&str>) -> bool {
        if !self.inner.config.strict_host_check {
            return false;
        }
        let Some(host_header) = host_header else {
            return true;
        };
        match self.inner.resolved_host_name().await {
            Ok(expected) => !strip_port(host_header).eq_ignore_ascii_case(strip_port(expected)),
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve host name for host check");
                true
            }
        }
    }

    /// Reconcile tracked subscriptions with the remote service.
    ///
    /// Remote subscriptions whose callback points at this listener, or whose
    /// id was persisted by an earlier run, are adopted when their key is
    /// tracked and still unclaimed; all others among them are deleted.
    /// Tracked subscriptions left without a remote id are then registered.
    pub async fn resume_existing_subscriptions(&self) -> Result<()> {
        let persisted = match self.inner.store.load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted subscriptions");
                Vec::new()
            }
        };
        let persisted_ids: HashSet<String> = persisted.into_iter().filter_map(|p| p.remote_id).collect();
        self.inner.store_loaded.store(true, Ordering::SeqCst);

        let base = self.inner.callback_base().await?;
        let remote = self
            .inner
            .api
            .eventsub()
            .get_subscriptions_paginated()
            .get_all()
            .await?;
        tracing::info!(remote = remote.len(), tracked = self.inner.subscriptions.len(), "Resuming subscriptions");

        let mut adopted: HashSet<String> = HashSet::new();
        for remote_sub in remote {
            let key = remote_sub
                .webhook_callback()
                .and_then(|callback| key_from_callback(&base, callback));
            if key.is_none() && !persisted_ids.contains(&remote_sub.id) {
                continue;
            }

            let status = remote_sub.status();
            let usable = matches!(
                status,
                HelixEventSubSubscriptionStatus::Enabled
                    | HelixEventSubSubscriptionStatus::WebhookCallbackVerificationPending
            );
            let tracked = key
                .as_deref()
                .and_then(|key| self.subscription(key))
                .filter(|s| s.status().is_active());

            match (key, tracked) {
                (Some(key), Some(subscription)) if usable && !adopted.contains(&key) => {
                    subscription.adopt(&remote_sub.id, status == HelixEventSubSubscriptionStatus::Enabled);
                    tracing::debug!(key = %key, remote_id = %remote_sub.id, "Adopted remote subscription");
                    adopted.insert(key);
                }
                (key, _) => {
                    let key = key.unwrap_or_default();
                    tracing::debug!(key = %key, remote_id = %remote_sub.id, status = %remote_sub.status, "Deleting stale remote subscription");
                    if let Err(e) = self.inner.api.eventsub().delete_subscription(&remote_sub.id).await {
                        tracing::warn!(remote_id = %remote_sub.id, error = %e, "Failed to delete stale remote subscription");
                    }
                }
            }
        }

        let to_register: Vec<_> = self
            .subscriptions()
            .into_iter()
            .filter(|s| !adopted.contains(s.key()) && s.remote_id().is_none() && s.status().is_active())
            .collect();
        let results = futures::future::join_all(to_register.iter().map(|s| s.register())).await;
        for (subscription, result) in to_register.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(key = %subscription.key(), error = %e, "Failed to register subscription on resume");
                self.inner
                    .subscriptions
                    .remove_if(subscription.key(), |_, tracked| Arc::ptr_eq(tracked, subscription));
            }
        }

        self.inner.persist().await;
        Ok(())
    }

    /// Authenticate and dispatch one inbound webhook request.
    pub async fn handle_request(&self, key: &str, headers: &EventSubHeaders, body: &[u8]) -> DispatchResponse {
        let (Some(message_id), Some(message_type), Some(timestamp), Some(signature)) = (
            headers.message_id.as_deref(),
            headers.message_type.as_deref(),
            headers.timestamp.as_deref(),
            headers.signature.as_deref(),
        ) else {
            tracing::warn!(key, "Request is missing EventSub headers");
            return DispatchResponse::status(400);
        };

        let Some(subscription) = self.subscription(key) else {
            tracing::warn!(key, message_id, message_type, "Message for unknown subscription");
            return DispatchResponse::status(404);
        };

        let secret = &self.inner.config.secret;
        let authenticated = verify_signature(secret, message_id, timestamp, body, signature).and_then(|()| {
            check_freshness(timestamp, self.inner.config.max_message_age, chrono::Utc::now())
        });
        if let Err(e) = authenticated {
            tracing::warn!(key, message_id, error = %e, "Rejected message with invalid signature");
            return DispatchResponse::status(403);
        }

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key, message_id, error = %e, "Message body is not JSON");
                return DispatchResponse::status(400);
            }
        };

        match MessageType::from_header(message_type) {
            MessageType::Verification => self.handle_verification(&subscription, &payload).await,
            MessageType::Notification => {
                let event = payload.get("event").cloned().unwrap_or(Value::Null);
                match subscription.handle_notification(message_id, event) {
                    NotificationOutcome::Accepted => {
                        tracing::debug!(key, message_id, "Notification accepted");
                        DispatchResponse::ok()
                    }
                    NotificationOutcome::Duplicate => {
                        tracing::debug!(key, message_id, "Duplicate notification dropped");
                        DispatchResponse::ok()
                    }
                    NotificationOutcome::Malformed(error) => {
                        tracing::error!(key, message_id, error = %error, "Notification payload could not be transformed");
                        DispatchResponse::ok()
                    }
                    NotificationOutcome::NotVerified(status) => {
                        tracing::warn!(key, message_id, %status, "Notification for unverified subscription");
                        DispatchResponse::status(404)
                    }
                }
            }
            MessageType::Revocation => {
                let remote_status = payload["subscription"]["status"].as_str().unwrap_or("unknown").to_string();
                let status = match HelixEventSubSubscriptionStatus::from_api(&remote_status) {
                    HelixEventSubSubscriptionStatus::WebhookCallbackVerificationFailed => SubscriptionStatus::Failed,
                    _ => SubscriptionStatus::Suspended,
                };
                self.inner
                    .subscriptions
                    .remove_if(key, |_, tracked| Arc::ptr_eq(tracked, &subscription));
                subscription.mark_revoked(status);
                tracing::warn!(key, reason = %remote_status, "Subscription revoked");
                self.inner.emit(ListenerEvent::Revoked {
                    key: key.to_string(),
                    status: remote_status,
                });
                self.inner.persist().await;
                DispatchResponse::ok()
            }
            MessageType::Unknown(other) => {
                tracing::warn!(key, message_type = %other, "Unknown message type");
                DispatchResponse::status(400)
            }
        }
    }

    async fn handle_verification(&self, subscription: &Arc<Subscription>, payload: &Value) -> DispatchResponse {
        let key = subscription.key().to_string();
        let Some(challenge) = payload.get("challenge").and_then(Value::as_str) else {
            tracing::warn!(key = %key, "Verification message without challenge");
            return DispatchResponse::status(400);
        };
        let remote_id = payload["subscription"]["id"].as_str();

        match subscription.handle_verification_challenge(challenge, remote_id) {
            Ok(challenge) => {
                tracing::info!(key = %key, "Subscription verified");
                self.inner.emit(ListenerEvent::VerifySuccess { key });
                self.inner.persist().await;
                DispatchResponse::challenge(challenge)
            }
            Err(e) => {
                tracing::warn!(key = %key, reason = %e, "Verification challenge rejected");
                self.inner.emit(ListenerEvent::VerifyFailure {
                    key,
                    reason: e.to_string(),
                });
                DispatchResponse::status(404)
            }
        }
    }

    /// Suspend every tracked subscription and clear the map.
    pub async fn suspend_all(&self) {
        let tracked = self.subscriptions();
        self.inner.subscriptions.clear();
        futures::future::join_all(tracked.iter().map(|s| s.suspend())).await;
        self.inner.persist().await;
        tracing::info!(count = tracked.len(), "All subscriptions suspended");
    }
}

impl std::fmt::Debug for EventSubListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubListener")
            .field("subscriptions", &self.inner.subscriptions.len())
            .field("ready_to_subscribe", &self.is_ready_to_subscribe())
            .finish_non_exhaustive()
    }
}
