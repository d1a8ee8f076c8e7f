//! `channel.raid` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelRaidEventData {
    from_broadcaster_user_id: String,
    from_broadcaster_user_login: String,
    from_broadcaster_user_name: String,
    to_broadcaster_user_id: String,
    to_broadcaster_user_login: String,
    to_broadcaster_user_name: String,
    viewers: u64,
}

/// A broadcaster raided another channel.
#[derive(Debug, Clone)]
pub struct ChannelRaidEvent {
    data: ChannelRaidEventData,
    client: TwitchApiClient,
}

impl ChannelRaidEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    pub fn raiding_broadcaster_id(&self) -> &str {
        &self.data.from_broadcaster_user_id
    }

    pub fn raiding_broadcaster_name(&self) -> &str {
        &self.data.from_broadcaster_user_login
    }

    pub fn raiding_broadcaster_display_name(&self) -> &str {
        &self.data.from_broadcaster_user_name
    }

    pub async fn raiding_broadcaster(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.raiding_broadcaster_id()).await
    }

    pub fn raided_broadcaster_id(&self) -> &str {
        &self.data.to_broadcaster_user_id
    }

    pub fn raided_broadcaster_name(&self) -> &str {
        &self.data.to_broadcaster_user_login
    }

    pub fn raided_broadcaster_display_name(&self) -> &str {
        &self.data.to_broadcaster_user_name
    }

    pub async fn raided_broadcaster(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.raided_broadcaster_id()).await
    }

    /// Number of viewers in the raid.
    pub fn viewers(&self) -> u64 {
        self.data.viewers
    }
}
