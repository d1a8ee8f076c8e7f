//! Event kinds
//!
//! An [`EventKind`] names one event type together with its scoping
//! parameters. It knows everything a subscription needs about that type: the
//! identity key, the remote type/version/condition, the scopes the remote
//! service checks, and how to turn a raw payload into a typed event.

use serde_json::{json, Value};
use twitch_api::TwitchApiClient;

use crate::events::{
    ChannelBanEvent, ChannelRaidEvent, ChannelRedemptionAddEvent, ChannelSubscriptionEvent,
    CharityCampaignProgressEvent, EventSubEvent, StreamOfflineEvent, UserAuthorizationRevokeEvent,
    UserUpdateEvent,
};

/// Which side of a raid the subscription follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaidDirection {
    /// Raids started by the broadcaster
    From,
    /// Raids targeting the broadcaster
    To,
}

impl RaidDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

/// One event type plus the parameters that scope it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChannelBan { user_id: String },
    UserUpdate { user_id: String },
    StreamOffline { user_id: String },
    ChannelRaid { user_id: String, direction: RaidDirection },
    ChannelSubscription { user_id: String },
    ChannelRedemptionAdd { user_id: String, reward_id: Option<String> },
    UserAuthorizationRevoke { client_id: String },
    CharityCampaignProgress { user_id: String },
}

impl EventKind {
    /// Remote EventSub type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ChannelBan { .. } => "channel.ban",
            Self::UserUpdate { .. } => "user.update",
            Self::StreamOffline { .. } => "stream.offline",
            Self::ChannelRaid { .. } => "channel.raid",
            Self::ChannelSubscription { .. } => "channel.subscribe",
            Self::ChannelRedemptionAdd { .. } => "channel.channel_points_custom_reward_redemption.add",
            Self::UserAuthorizationRevoke { .. } => "user.authorization.revoke",
            Self::CharityCampaignProgress { .. } => "channel.charity_campaign.progress",
        }
    }

    pub fn version(&self) -> &'static str {
        "1"
    }

    /// Identity key: event type followed by the scoping parameters.
    pub fn key(&self) -> String {
        let event_type = self.event_type();
        match self {
            Self::ChannelBan { user_id }
            | Self::UserUpdate { user_id }
            | Self::StreamOffline { user_id }
            | Self::ChannelSubscription { user_id }
            | Self::CharityCampaignProgress { user_id } => format!("{event_type}.{user_id}"),
            Self::ChannelRaid { user_id, direction } => {
                format!("{event_type}.{}.{user_id}", direction.as_str())
            }
            Self::ChannelRedemptionAdd { user_id, reward_id } => match reward_id {
                Some(reward_id) => format!("{event_type}.{user_id}.{reward_id}"),
                None => format!("{event_type}.{user_id}"),
            },
            Self::UserAuthorizationRevoke { client_id } => format!("{event_type}.{client_id}"),
        }
    }

    /// Remote subscription condition.
    pub fn condition(&self) -> Value {
        match self {
            Self::ChannelBan { user_id }
            | Self::StreamOffline { user_id }
            | Self::ChannelSubscription { user_id }
            | Self::CharityCampaignProgress { user_id } => json!({ "broadcaster_user_id": user_id }),
            Self::UserUpdate { user_id } => json!({ "user_id": user_id }),
            Self::ChannelRaid { user_id, direction: RaidDirection::From } => {
                json!({ "from_broadcaster_user_id": user_id })
            }
            Self::ChannelRaid { user_id, direction: RaidDirection::To } => {
                json!({ "to_broadcaster_user_id": user_id })
            }
            Self::ChannelRedemptionAdd { user_id, reward_id } => match reward_id {
                Some(reward_id) => json!({ "broadcaster_user_id": user_id, "reward_id": reward_id }),
                None => json!({ "broadcaster_user_id": user_id }),
            },
            Self::UserAuthorizationRevoke { client_id } => json!({ "client_id": client_id }),
        }
    }

    /// User whose authorization the remote service checks, if any.
    pub fn authorizing_user(&self) -> Option<&str> {
        match self {
            Self::ChannelBan { user_id }
            | Self::ChannelSubscription { user_id }
            | Self::ChannelRedemptionAdd { user_id, .. }
            | Self::CharityCampaignProgress { user_id } => Some(user_id),
            Self::UserUpdate { .. }
            | Self::StreamOffline { .. }
            | Self::ChannelRaid { .. }
            | Self::UserAuthorizationRevoke { .. } => None,
        }
    }

    /// Scopes of which one must be granted to the authorizing user.
    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            Self::ChannelBan { .. } => &["channel:moderate"],
            Self::ChannelSubscription { .. } => &["channel:read:subscriptions"],
            Self::ChannelRedemptionAdd { .. } => {
                &["channel:read:redemptions", "channel:manage:redemptions"]
            }
            Self::CharityCampaignProgress { .. } => &["channel:read:charity"],
            Self::UserUpdate { .. }
            | Self::StreamOffline { .. }
            | Self::ChannelRaid { .. }
            | Self::UserAuthorizationRevoke { .. } => &[],
        }
    }

    /// Turn a raw `event` payload into the typed event of this kind.
    pub fn transform(
        &self,
        raw: Value,
        client: TwitchApiClient,
    ) -> Result<EventSubEvent, serde_json::Error> {
        Ok(match self {
            Self::ChannelBan { .. } => EventSubEvent::ChannelBan(ChannelBanEvent::from_raw(raw, client)?),
            Self::UserUpdate { .. } => EventSubEvent::UserUpdate(UserUpdateEvent::from_raw(raw, client)?),
            Self::StreamOffline { .. } => {
                EventSubEvent::StreamOffline(StreamOfflineEvent::from_raw(raw, client)?)
            }
            Self::ChannelRaid { .. } => EventSubEvent::ChannelRaid(ChannelRaidEvent::from_raw(raw, client)?),
            Self::ChannelSubscription { .. } => {
                EventSubEvent::ChannelSubscription(ChannelSubscriptionEvent::from_raw(raw, client)?)
            }
            Self::ChannelRedemptionAdd { .. } => {
                EventSubEvent::ChannelRedemptionAdd(ChannelRedemptionAddEvent::from_raw(raw, client)?)
            }
            Self::UserAuthorizationRevoke { .. } => EventSubEvent::UserAuthorizationRevoke(
                UserAuthorizationRevokeEvent::from_raw(raw, client)?,
            ),
            Self::CharityCampaignProgress { .. } => EventSubEvent::CharityCampaignProgress(
                CharityCampaignProgressEvent::from_raw(raw, client)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use twitch_api::mock::MockHelixCaller;

    fn ban(user_id: &str) -> EventKind {
        EventKind::ChannelBan { user_id: user_id.to_string() }
    }

    #[rstest]
    #[case(ban("1337"), "channel.ban.1337")]
    #[case(EventKind::UserUpdate { user_id: "123".into() }, "user.update.123")]
    #[case(EventKind::StreamOffline { user_id: "9".into() }, "stream.offline.9")]
    #[case(
        EventKind::ChannelRaid { user_id: "5".into(), direction: RaidDirection::From },
        "channel.raid.from.5"
    )]
    #[case(
        EventKind::ChannelRaid { user_id: "5".into(), direction: RaidDirection::To },
        "channel.raid.to.5"
    )]
    #[case(
        EventKind::ChannelRedemptionAdd { user_id: "7".into(), reward_id: None },
        "channel.channel_points_custom_reward_redemption.add.7"
    )]
    #[case(
        EventKind::ChannelRedemptionAdd { user_id: "7".into(), reward_id: Some("r1".into()) },
        "channel.channel_points_custom_reward_redemption.add.7.r1"
    )]
    #[case(EventKind::UserAuthorizationRevoke { client_id: "abc".into() }, "user.authorization.revoke.abc")]
    #[case(
        EventKind::CharityCampaignProgress { user_id: "3".into() },
        "channel.charity_campaign.progress.3"
    )]
    fn test_keys(#[case] kind: EventKind, #[case] expected: &str) {
        assert_eq!(kind.key(), expected);
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(ban("42").key(), ban("42").key());
        assert_ne!(ban("42").key(), ban("43").key());
    }

    #[test]
    fn test_conditions() {
        assert_eq!(ban("1").condition(), json!({ "broadcaster_user_id": "1" }));
        assert_eq!(
            EventKind::ChannelRaid { user_id: "1".into(), direction: RaidDirection::To }.condition(),
            json!({ "to_broadcaster_user_id": "1" })
        );
        assert_eq!(
            EventKind::ChannelRedemptionAdd { user_id: "1".into(), reward_id: Some("r".into()) }
                .condition(),
            json!({ "broadcaster_user_id": "1", "reward_id": "r" })
        );
    }

    #[test]
    fn test_authorization_requirements() {
        assert_eq!(ban("1").authorizing_user(), Some("1"));
        assert_eq!(ban("1").scopes(), &["channel:moderate"]);
        assert!(EventKind::UserUpdate { user_id: "1".into() }.authorizing_user().is_none());
    }

    #[test]
    fn test_transform_picks_matching_variant() {
        let client = TwitchApiClient::new(Arc::new(MockHelixCaller::new()));
        let event = EventKind::StreamOffline { user_id: "1337".into() }
            .transform(
                json!({
                    "broadcaster_user_id": "1337",
                    "broadcaster_user_login": "cool_user",
                    "broadcaster_user_name": "Cool_User"
                }),
                client,
            )
            .unwrap();

        match event {
            EventSubEvent::StreamOffline(e) => assert_eq!(e.broadcaster_id(), "1337"),
            other => panic!("Expected StreamOffline, got {other:?}"),
        }
    }
}
