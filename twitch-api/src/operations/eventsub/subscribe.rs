//! Subscribe operation for EventSub webhook subscriptions

use serde::Deserialize;
use serde_json::{json, Value};

use super::{EventSubTransportOptions, HelixEventSubSubscription, SUBSCRIPTIONS_PATH};
use crate::{ApiError, Result};
use helix_client::{ApiCallOptions, HelixCaller, HttpMethod};

/// Subscribe operation for EventSub subscriptions
///
/// Creates one remote subscription. The service answers with the new
/// subscription in `webhook_callback_verification_pending` state and then
/// sends a verification challenge to the callback URL.
pub struct SubscribeOperation;

/// Request for Subscribe operation
#[derive(Debug, Clone)]
pub struct SubscribeRequest {
    /// EventSub type, e.g. `channel.ban`
    pub subscription_type: String,
    /// EventSub type version, e.g. `1`
    pub version: String,
    /// Scoping condition, e.g. `{"broadcaster_user_id": "1337"}`
    pub condition: Value,
    /// Webhook transport
    pub transport: EventSubTransportOptions,
    /// User whose authorization the subscription depends on
    pub user_id: Option<String>,
    /// Scopes of which one must be granted for that user
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeResponse {
    data: Vec<HelixEventSubSubscription>,
}

impl SubscribeOperation {
    /// Execute a subscription request
    ///
    /// # Returns
    /// The remote subscription as created by the service
    pub async fn execute(
        caller: &dyn HelixCaller,
        request: &SubscribeRequest,
    ) -> Result<HelixEventSubSubscription> {
        let mut options = ApiCallOptions::new(HttpMethod::Post, SUBSCRIPTIONS_PATH).with_json(json!({
            "type": request.subscription_type,
            "version": request.version,
            "condition": request.condition,
            "transport": request.transport,
        }));
        options.scopes = request.scopes.clone();
        options.user_id = request.user_id.clone();

        let body = caller
            .call_api(options)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse(SUBSCRIPTIONS_PATH.to_string()))?;

        let response: SubscribeResponse = serde_json::from_value(body)?;
        response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::ParseError("subscribe response contained no subscription".to_string()))
    }
}
