//! Payment-channel models used by the expiry watcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ChannelId;

/// State of a payment channel as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChannel {
    pub account: String,
    pub destination: String,
    /// Total drops locked into the channel.
    pub amount: u64,
    /// Drops already paid out of the channel.
    pub balance: u64,
    /// Seconds the source must wait between requesting close and expiry.
    pub settle_delay: u32,
    pub public_key: String,
    /// Set once the source has requested a close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Immutable expiry set at channel creation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_after: Option<DateTime<Utc>>,
}

impl PaymentChannel {
    /// The instant the channel closes, if a close is scheduled.
    pub fn closes_at(&self) -> Option<DateTime<Utc>> {
        self.expiration.or(self.cancel_after)
    }
}

/// Emitted by the watcher when a watched channel has a close scheduled.
#[derive(Debug, Clone)]
pub struct ChannelCloseEvent {
    pub channel_id: ChannelId,
    pub closes_at: DateTime<Utc>,
}
