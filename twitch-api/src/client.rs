//! Grouped access to the Helix endpoints the SDK uses

use std::sync::Arc;

use crate::operations::eventsub::{
    DeleteSubscriptionOperation, DeleteSubscriptionRequest, HelixEventSubSubscription,
    ListSubscriptionsFilter, ListSubscriptionsOperation, SubscribeOperation, SubscribeRequest,
};
use crate::operations::users::{GetUsersOperation, HelixUser};
use crate::pagination::HelixPaginatedRequest;
use crate::Result;
use helix_client::HelixCaller;

/// Entry point over a shared [`HelixCaller`]
///
/// Cheap to clone; every clone shares the same caller.
#[derive(Clone)]
pub struct TwitchApiClient {
    caller: Arc<dyn HelixCaller>,
}

impl TwitchApiClient {
    pub fn new(caller: Arc<dyn HelixCaller>) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Arc<dyn HelixCaller> {
        &self.caller
    }

    pub fn eventsub(&self) -> EventSubApi<'_> {
        EventSubApi { caller: &self.caller }
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { caller: &self.caller }
    }
}

impl std::fmt::Debug for TwitchApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchApiClient").finish_non_exhaustive()
    }
}

/// EventSub subscription management
pub struct EventSubApi<'a> {
    caller: &'a Arc<dyn HelixCaller>,
}

impl EventSubApi<'_> {
    pub async fn create_subscription(
        &self,
        request: &SubscribeRequest,
    ) -> Result<HelixEventSubSubscription> {
        SubscribeOperation::execute(self.caller.as_ref(), request).await
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<()> {
        let request = DeleteSubscriptionRequest { id: id.to_string() };
        DeleteSubscriptionOperation::execute(self.caller.as_ref(), &request).await
    }

    /// All subscriptions of the calling application, page by page.
    pub fn get_subscriptions_paginated(&self) -> HelixPaginatedRequest<HelixEventSubSubscription> {
        self.get_subscriptions_filtered(ListSubscriptionsFilter::All)
    }

    pub fn get_subscriptions_filtered(
        &self,
        filter: ListSubscriptionsFilter,
    ) -> HelixPaginatedRequest<HelixEventSubSubscription> {
        ListSubscriptionsOperation::paginated(Arc::clone(self.caller), filter)
    }
}

/// User lookup
pub struct UsersApi<'a> {
    caller: &'a Arc<dyn HelixCaller>,
}

impl UsersApi<'_> {
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<HelixUser>> {
        let users = GetUsersOperation::execute(self.caller.as_ref(), &[id.to_string()]).await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    pub async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<HelixUser>> {
        GetUsersOperation::execute(self.caller.as_ref(), ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHelixCaller;
    use crate::operations::eventsub::EventSubTransportOptions;
    use crate::HelixEventSubSubscriptionStatus;
    use helix_client::HttpMethod;
    use serde_json::json;

    fn client_with(mock: Arc<MockHelixCaller>) -> TwitchApiClient {
        TwitchApiClient::new(mock)
    }

    #[tokio::test]
    async fn test_create_list_delete_cycle() {
        let mock = Arc::new(MockHelixCaller::new());
        let api = client_with(Arc::clone(&mock));

        let created = api
            .eventsub()
            .create_subscription(&SubscribeRequest {
                subscription_type: "stream.offline".to_string(),
                version: "1".to_string(),
                condition: json!({ "broadcaster_user_id": "42" }),
                transport: EventSubTransportOptions::webhook(
                    "https://example.com/event/stream.offline.42",
                    "s3cretvalue",
                ),
                user_id: None,
                scopes: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(
            created.status(),
            HelixEventSubSubscriptionStatus::WebhookCallbackVerificationPending
        );

        let listed = api.eventsub().get_subscriptions_paginated().get_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);

        api.eventsub().delete_subscription(&created.id).await.unwrap();
        assert!(mock.remote_subscriptions().is_empty());
        assert_eq!(mock.calls_to(HttpMethod::Delete, "eventsub/subscriptions").len(), 1);
    }

    #[tokio::test]
    async fn test_listing_walks_every_page() {
        let mock = Arc::new(MockHelixCaller::new().with_page_size(2));
        for i in 0..5 {
            mock.insert_remote_subscription(
                &format!("sub-{i}"),
                "channel.ban",
                "enabled",
                "https://example.com/event/x",
            );
        }
        let api = client_with(Arc::clone(&mock));

        let all = api.eventsub().get_subscriptions_paginated().get_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(mock.calls_to(HttpMethod::Get, "eventsub/subscriptions").len(), 3);
    }

    #[tokio::test]
    async fn test_filtered_listing_sends_query() {
        let mock = Arc::new(MockHelixCaller::new());
        let api = client_with(Arc::clone(&mock));

        api.eventsub()
            .get_subscriptions_filtered(ListSubscriptionsFilter::Status("enabled".to_string()))
            .get_next()
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls[0].query, vec![("status".to_string(), "enabled".to_string())]);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let mock = Arc::new(MockHelixCaller::new());
        let api = client_with(mock);

        let user = api.users().get_user_by_id("1337").await.unwrap().unwrap();
        assert_eq!(user.id, "1337");
        assert_eq!(user.login, "user1337");
    }

    #[tokio::test]
    async fn test_get_user_by_id_missing_user() {
        let mock = Arc::new(
            MockHelixCaller::new().with_handler(|_| Some(Ok(Some(json!({ "data": [] }))))),
        );
        let api = client_with(mock);

        assert!(api.users().get_user_by_id("404").await.unwrap().is_none());
    }
}
