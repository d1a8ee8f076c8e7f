//! `channel.ban` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelBanEventData {
    broadcaster_user_id: String,
    broadcaster_user_login: String,
    broadcaster_user_name: String,
    user_id: String,
    user_login: String,
    user_name: String,
    moderator_user_id: String,
    moderator_user_login: String,
    moderator_user_name: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    banned_at: Option<String>,
    #[serde(default)]
    ends_at: Option<String>,
    #[serde(default)]
    is_permanent: bool,
}

/// A user was banned in a channel.
#[derive(Debug, Clone)]
pub struct ChannelBanEvent {
    data: ChannelBanEventData,
    client: TwitchApiClient,
}

impl ChannelBanEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    pub fn broadcaster_id(&self) -> &str {
        &self.data.broadcaster_user_id
    }

    pub fn broadcaster_name(&self) -> &str {
        &self.data.broadcaster_user_login
    }

    pub fn broadcaster_display_name(&self) -> &str {
        &self.data.broadcaster_user_name
    }

    /// Look up the broadcaster.
    pub async fn broadcaster(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.broadcaster_id()).await
    }

    /// ID of the banned user.
    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.data.user_login
    }

    pub fn user_display_name(&self) -> &str {
        &self.data.user_name
    }

    /// Look up the banned user.
    pub async fn user(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.user_id()).await
    }

    pub fn moderator_id(&self) -> &str {
        &self.data.moderator_user_id
    }

    pub fn moderator_name(&self) -> &str {
        &self.data.moderator_user_login
    }

    pub fn moderator_display_name(&self) -> &str {
        &self.data.moderator_user_name
    }

    pub fn reason(&self) -> &str {
        &self.data.reason
    }

    pub fn banned_at(&self) -> Option<&str> {
        self.data.banned_at.as_deref()
    }

    /// End of a timeout; `None` for permanent bans.
    pub fn ends_at(&self) -> Option<&str> {
        self.data.ends_at.as_deref()
    }

    pub fn is_permanent(&self) -> bool {
        self.data.is_permanent
    }
}
