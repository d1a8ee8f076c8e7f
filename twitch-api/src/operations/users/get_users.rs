//! Get Users operation

use serde::Deserialize;

use crate::pagination::data_array;
use crate::{ApiError, Result};
use helix_client::{ApiCallOptions, HelixCaller, HttpMethod};

const USERS_PATH: &str = "users";

/// Maximum number of ids or logins per request
pub const MAX_USERS_PER_REQUEST: usize = 100;

/// A Twitch user as returned by the users endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub user_type: String,
    #[serde(default)]
    pub broadcaster_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub offline_image_url: String,
    #[serde(default)]
    pub created_at: String,
}

/// Looks up users by id
pub struct GetUsersOperation;

impl GetUsersOperation {
    pub async fn execute(caller: &dyn HelixCaller, ids: &[String]) -> Result<Vec<HelixUser>> {
        if ids.len() > MAX_USERS_PER_REQUEST {
            return Err(ApiError::InvalidParameter(format!(
                "at most {MAX_USERS_PER_REQUEST} user ids per request, got {}",
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let options = ids.iter().fold(
            ApiCallOptions::new(HttpMethod::Get, USERS_PATH),
            |options, id| options.with_query("id", id.clone()),
        );
        let body = caller.call_api(options).await?;
        data_array(body, USERS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHelixCaller;

    #[tokio::test]
    async fn test_get_users_by_id() {
        let caller = MockHelixCaller::new();
        let users = GetUsersOperation::execute(&caller, &["1337".to_string(), "42".to_string()])
            .await
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "1337");
        assert_eq!(caller.calls()[0].query.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_call() {
        let caller = MockHelixCaller::new();
        let users = GetUsersOperation::execute(&caller, &[]).await.unwrap();
        assert!(users.is_empty());
        assert!(caller.calls().is_empty());
    }

    #[tokio::test]
    async fn test_too_many_ids_rejected() {
        let caller = MockHelixCaller::new();
        let ids: Vec<String> = (0..=MAX_USERS_PER_REQUEST).map(|i| i.to_string()).collect();
        let err = GetUsersOperation::execute(&caller, &ids).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }
}
