//! `stream.offline` events

use serde::Deserialize;
use serde_json::Value;
use twitch_api::{HelixUser, TwitchApiClient};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamOfflineEventData {
    broadcaster_user_id: String,
    broadcaster_user_login: String,
    broadcaster_user_name: String,
}

/// A stream went offline.
#[derive(Debug, Clone)]
pub struct StreamOfflineEvent {
    data: StreamOfflineEventData,
    client: TwitchApiClient,
}

impl StreamOfflineEvent {
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
}
