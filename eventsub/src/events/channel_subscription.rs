//! `channel.subscribe` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelSubscriptionEventData {
    broadcaster_user_id: String,
    broadcaster_user_login: String,
    broadcaster_user_name: String,
    user_id: String,
    user_login: String,
    user_name: String,
    tier: String,
    #[serde(default)]
    is_gift: bool,
}

/// A user subscribed to a channel.
#[derive(Debug, Clone)]
pub struct ChannelSubscriptionEvent {
    data: ChannelSubscriptionEventData,
    client: TwitchApiClient,
}

impl ChannelSubscriptionEvent {
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

    pub async fn broadcaster(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.broadcaster_id()).await
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

    /// `1000`, `2000` or `3000`.
    pub fn tier(&self) -> &str {
        &self.data.tier
    }

    pub fn is_gift(&self) -> bool {
        self.data.is_gift
    }
}
