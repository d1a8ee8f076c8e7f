//! `channel.channel_points_custom_reward_redemption.add` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

/// The custom reward a redemption was made for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedemptionReward {
    pub id: String,
    pub title: String,
    pub cost: u64,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelRedemptionAddEventData {
    id: String,
    broadcaster_user_id: String,
    broadcaster_user_login: String,
    broadcaster_user_name: String,
    user_id: String,
    user_login: String,
    user_name: String,
    #[serde(default)]
    user_input: String,
    status: String,
    reward: RedemptionReward,
    redeemed_at: String,
}

/// A viewer redeemed a custom channel points reward.
#[derive(Debug, Clone)]
pub struct ChannelRedemptionAddEvent {
    data: ChannelRedemptionAddEventData,
    client: TwitchApiClient,
}

impl ChannelRedemptionAddEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    /// ID of the redemption.
    pub fn id(&self) -> &str {
        &self.data.id
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

    /// Text the user entered, if the reward asks for input.
    pub fn input(&self) -> &str {
        &self.data.user_input
    }

    /// `unfulfilled`, `fulfilled`, `canceled` or `unknown`.
    pub fn status(&self) -> &str {
        &self.data.status
    }

    pub fn reward(&self) -> &RedemptionReward {
        &self.data.reward
    }

    pub fn redeemed_at(&self) -> &str {
        &self.data.redeemed_at
    }
}
