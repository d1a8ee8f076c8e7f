//! `user.authorization.revoke` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserAuthorizationRevokeEventData {
    client_id: String,
    user_id: String,
    #[serde(default)]
    user_login: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
}

/// A user revoked the authorization of an application.
#[derive(Debug, Clone)]
pub struct UserAuthorizationRevokeEvent {
    data: UserAuthorizationRevokeEventData,
    client: TwitchApiClient,
}

impl UserAuthorizationRevokeEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.data.client_id
    }

    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    /// `None` if the user no longer exists.
    pub fn user_name(&self) -> Option<&str> {
        self.data.user_login.as_deref()
    }

    pub fn user_display_name(&self) -> Option<&str> {
        self.data.user_name.as_deref()
    }

    pub async fn user(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.user_id()).await
    }
}
