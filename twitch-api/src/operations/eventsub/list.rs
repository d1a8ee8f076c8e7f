//! List operation for EventSub subscriptions

use std::sync::Arc;

use super::{HelixEventSubSubscription, SUBSCRIPTIONS_PATH};
use crate::pagination::HelixPaginatedRequest;
use helix_client::{ApiCallOptions, HelixCaller, HttpMethod};

/// Lists remote EventSub subscriptions page by page
pub struct ListSubscriptionsOperation;

/// Optional server-side filter; the API accepts at most one of these
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListSubscriptionsFilter {
    #[default]
    All,
    Status(String),
    Type(String),
    UserId(String),
}

impl ListSubscriptionsOperation {
    pub fn paginated(
        caller: Arc<dyn HelixCaller>,
        filter: ListSubscriptionsFilter,
    ) -> HelixPaginatedRequest<HelixEventSubSubscription> {
        let options = ApiCallOptions::new(HttpMethod::Get, SUBSCRIPTIONS_PATH);
        let options = match filter {
            ListSubscriptionsFilter::All => options,
            ListSubscriptionsFilter::Status(status) => options.with_query("status", status),
            ListSubscriptionsFilter::Type(kind) => options.with_query("type", kind),
            ListSubscriptionsFilter::UserId(id) => options.with_query("user_id", id),
        };
        HelixPaginatedRequest::new(caller, options)
    }
}
