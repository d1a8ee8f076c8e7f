//! Delete operation for EventSub subscriptions

use super::SUBSCRIPTIONS_PATH;
use crate::Result;
use helix_client::{ApiCallOptions, HelixCaller, HttpMethod};

/// Deletes one remote EventSub subscription by its remote id
pub struct DeleteSubscriptionOperation;

/// Request for Delete operation
#[derive(Debug, Clone)]
pub struct DeleteSubscriptionRequest {
    /// Remote subscription id assigned by the service
    pub id: String,
}

impl DeleteSubscriptionOperation {
    pub async fn execute(caller: &dyn HelixCaller, request: &DeleteSubscriptionRequest) -> Result<()> {
        let options =
            ApiCallOptions::new(HttpMethod::Delete, SUBSCRIPTIONS_PATH).with_query("id", &request.id);
        caller.call_api(options).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHelixCaller;

    #[tokio::test]
    async fn test_delete_sends_id_query() {
        let caller = MockHelixCaller::new();
        DeleteSubscriptionOperation::execute(
            &caller,
            &DeleteSubscriptionRequest { id: "remote-1".to_string() },
        )
        .await
        .unwrap();

        let calls = caller.calls();
        assert_eq!(calls[0].method, HttpMethod::Delete);
        assert_eq!(calls[0].query, vec![("id".to_string(), "remote-1".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_not_found_is_error() {
        let caller = MockHelixCaller::new();
        caller.fail_with(HttpMethod::Delete, SUBSCRIPTIONS_PATH, 404);

        let err = DeleteSubscriptionOperation::execute(
            &caller,
            &DeleteSubscriptionRequest { id: "gone".to_string() },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
