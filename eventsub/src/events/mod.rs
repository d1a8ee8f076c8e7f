//! Typed EventSub events
//!
//! Each event wraps the deserialized wire payload together with the API
//! client handle, exposing read-only accessors and, where the payload names
//! a user, helpers that look that user up.

pub mod channel_ban;
pub mod channel_raid;
pub mod channel_redemption_add;
pub mod channel_subscription;
pub mod charity_campaign_progress;
pub mod stream_offline;
pub mod user_authorization_revoke;
pub mod user_update;

pub use channel_ban::ChannelBanEvent;
pub use channel_raid::ChannelRaidEvent;
pub use channel_redemption_add::{ChannelRedemptionAddEvent, RedemptionReward};
pub use channel_subscription::ChannelSubscriptionEvent;
pub use charity_campaign_progress::{CharityAmount, CharityCampaignProgressEvent};
pub use stream_offline::StreamOfflineEvent;
pub use user_authorization_revoke::UserAuthorizationRevokeEvent;
pub use user_update::UserUpdateEvent;

/// Any event a subscription can deliver.
#[derive(Debug, Clone)]
pub enum EventSubEvent {
    ChannelBan(ChannelBanEvent),
    UserUpdate(UserUpdateEvent),
    StreamOffline(StreamOfflineEvent),
    ChannelRaid(ChannelRaidEvent),
    ChannelSubscription(ChannelSubscriptionEvent),
    ChannelRedemptionAdd(ChannelRedemptionAddEvent),
    UserAuthorizationRevoke(UserAuthorizationRevokeEvent),
    CharityCampaignProgress(CharityCampaignProgressEvent),
}
