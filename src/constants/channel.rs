//! Constants for payment-channel handling.
//!
//! This module contains protocol prefixes and default values used by the
//! channel helpers and the expiry watcher.

use chrono::Duration;

/// Number of drops in one XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Minimum time (in seconds) a channel must remain open past "now" for an
/// incoming channel to be accepted.
pub const MIN_SETTLE_DELAY_SECONDS: i64 = 3600;

/// Default interval (in seconds) between channel-expiry polls.
pub const DEFAULT_WATCH_INTERVAL_SECONDS: u64 = 5 * 60;

/// Preimage prefix for deriving a payment-channel id (`\0` followed by `x`).
pub const CHANNEL_ID_PREFIX: &[u8] = b"\0x";

/// Prefix of an encoded claim over a payment channel.
pub const CLAIM_PREFIX: &[u8] = b"CLM\0";

/// Prefix of an encoded channel-ownership proof.
pub const CHANNEL_PROOF_PREFIX: &[u8] = b"channel_signature";

/// Get the minimum settle delay as a duration
pub fn get_min_settle_delay() -> Duration {
    Duration::seconds(MIN_SETTLE_DELAY_SECONDS)
}
