//! `channel.charity_campaign.progress` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

/// A monetary amount in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharityAmount {
    /// Amount in the currency's minor unit, e.g. cents
    pub value: i64,
    pub decimal_places: u32,
    /// ISO 4217 currency code
    pub currency: String,
}

impl CharityAmount {
    /// Amount in major units, e.g. `5.5` for 550 with two decimal places.
    pub fn localized_value(&self) -> f64 {
        self.value as f64 / 10f64.powi(self.decimal_places as i32)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CharityCampaignProgressEventData {
    id: String,
    broadcaster_id: String,
    broadcaster_login: String,
    broadcaster_name: String,
    charity_name: String,
    #[serde(default)]
    charity_description: String,
    #[serde(default)]
    charity_logo: String,
    #[serde(default)]
    charity_website: String,
    current_amount: CharityAmount,
    target_amount: CharityAmount,
}

/// Progress of a charity campaign in a channel.
#[derive(Debug, Clone)]
pub struct CharityCampaignProgressEvent {
    data: CharityCampaignProgressEventData,
    client: TwitchApiClient,
}

impl CharityCampaignProgressEvent {
    pub(crate) fn from_raw(raw: Value, client: TwitchApiClient) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::from_value(raw)?,
            client,
        })
    }

    /// ID of the campaign.
    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn broadcaster_id(&self) -> &str {
        &self.data.broadcaster_id
    }

    pub fn broadcaster_name(&self) -> &str {
        &self.data.broadcaster_login
    }

    pub fn broadcaster_display_name(&self) -> &str {
        &self.data.broadcaster_name
    }

    pub async fn broadcaster(&self) -> twitch_api::Result<Option<HelixUser>> {
        self.client.users().get_user_by_id(self.broadcaster_id()).await
    }

    pub fn charity_name(&self) -> &str {
        &self.data.charity_name
    }

    pub fn charity_description(&self) -> &str {
        &self.data.charity_description
    }

    /// URL of a 100x100 PNG logo.
    pub fn charity_logo(&self) -> &str {
        &self.data.charity_logo
    }

    pub fn charity_website(&self) -> &str {
        &self.data.charity_website
    }

    pub fn current_amount(&self) -> &CharityAmount {
        &self.data.current_amount
    }

    pub fn target_amount(&self) -> &CharityAmount {
        &self.data.target_amount
    }
}
