//! `user.update` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserUpdateEventData {
    user_id: String,
    user_login: String,
    user_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    description: String,
}

/// A user updated their account.
#[derive(Debug, Clone)]
pub struct UserUpdateEvent {
    data: UserUpdateEventData,
    client: TwitchApiClient,
}

impl UserUpdateEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.data.user_login
    }

    pub fn user_display_name(&self) -> &str {
        &self.data.user_name
    }

    pub async fn user(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.user_id()).await
    }

    /// Only present with the `user:read:email` scope.
    pub fn email(&self) -> Option<&str> {
        self.data.email.as_deref()
    }

    pub fn email_verified(&self) -> bool {
        self.data.email_verified
    }

    pub fn description(&self) -> &str {
        &self.data.description
    }
}
