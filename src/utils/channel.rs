//! Payment-channel derivations and encodings.
//!
//! Byte layouts here are ledger protocol: the channel id is the SHA-512-half
//! of a fixed preimage over the participating accounts and the creating
//! transaction's sequence number; claims and channel proofs are
//! prefix-delimited concatenations signed out of band.

use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::constants::{
    get_min_settle_delay, CHANNEL_ID_PREFIX, CHANNEL_PROOF_PREFIX, CLAIM_PREFIX,
    MIN_SETTLE_DELAY_SECONDS,
};
use crate::models::{ChannelId, SubmitterError};

/// Decodes a classic ledger address into its 20-byte account id.
///
/// Addresses are base58check in the ripple alphabet with a zero version byte.
pub fn decode_account_id(address: &str) -> Result<[u8; 20], SubmitterError> {
    let payload = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(Some(0))
        .into_vec()
        .map_err(|err| {
            SubmitterError::ValidationError(format!("invalid ledger address {address}: {err}"))
        })?;
    // Strip the version byte checked above.
    payload
        .get(1..)
        .and_then(|account| <[u8; 20]>::try_from(account).ok())
        .ok_or_else(|| {
            SubmitterError::ValidationError(format!(
                "ledger address {address} does not hold a 20-byte account id"
            ))
        })
}

/// Derives the id of the payment channel created by `source` towards
/// `destination` in a transaction with the given account sequence.
pub fn compute_channel_id(
    source: &str,
    destination: &str,
    sequence: u32,
) -> Result<ChannelId, SubmitterError> {
    let mut hasher = Sha512::new();
    hasher.update(CHANNEL_ID_PREFIX);
    hasher.update(decode_account_id(source)?);
    hasher.update(decode_account_id(destination)?);
    hasher.update(sequence.to_be_bytes());
    let digest = hasher.finalize();
    // SHA-512-half: the first 32 bytes.
    ChannelId::new(hex::encode_upper(&digest[..32]))
}

/// Encodes a claim for `amount` drops against a channel, ready for signing.
pub fn encode_claim(amount: u64, channel_id: &ChannelId) -> Vec<u8> {
    let mut claim = Vec::with_capacity(CLAIM_PREFIX.len() + 32 + 8);
    claim.extend_from_slice(CLAIM_PREFIX);
    claim.extend_from_slice(&channel_id.to_bytes());
    claim.extend_from_slice(&amount.to_be_bytes());
    claim
}

/// Encodes a proof of channel ownership over a base64-encoded account token.
pub fn encode_channel_proof(
    channel_id: &ChannelId,
    account: &str,
) -> Result<Vec<u8>, SubmitterError> {
    let account_bytes = base64::engine::general_purpose::STANDARD
        .decode(account)
        .map_err(|err| {
            SubmitterError::ValidationError(format!("account must be base64: {err}"))
        })?;
    let mut proof =
        Vec::with_capacity(CHANNEL_PROOF_PREFIX.len() + 32 + account_bytes.len());
    proof.extend_from_slice(CHANNEL_PROOF_PREFIX);
    proof.extend_from_slice(&channel_id.to_bytes());
    proof.extend_from_slice(&account_bytes);
    Ok(proof)
}

/// HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// A random destination tag.
pub fn random_tag() -> u32 {
    rand::random()
}

/// Rejects channel expiries closer than the minimum settle delay from now.
pub fn check_channel_expiry(expiry: DateTime<Utc>) -> Result<(), SubmitterError> {
    let earliest_acceptable = Utc::now() + get_min_settle_delay();
    if earliest_acceptable > expiry {
        return Err(SubmitterError::ValidationError(format!(
            "incoming channel expires too soon. minimum expiry is {MIN_SETTLE_DELAY_SECONDS} seconds from now, channel expires at {expiry}"
        )));
    }
    Ok(())
}
