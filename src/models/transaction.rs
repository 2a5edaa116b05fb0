//! Transaction-side domain models: validated transaction ids, the transaction
//! kind allow-list with its per-kind parameters, and the request/response
//! types exchanged with the ledger client.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::constants::{MALFORMED_RESULT_PREFIX, SUCCESS_RESULT_CODE};
use crate::models::SubmitterError;

static TRANSACTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{64}$").expect("static pattern compiles"));

/// A 64-character hexadecimal ledger hash.
///
/// Identifies either a submitted transaction or a payment channel (both share
/// the same format on the ledger). Validated at construction; the inner string
/// is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Validates and wraps a 64-hex-character id.
    pub fn new(id: impl Into<String>) -> Result<Self, SubmitterError> {
        let id = id.into();
        if !TRANSACTION_ID_PATTERN.is_match(&id) {
            return Err(SubmitterError::ValidationError(format!(
                "id must be a 64-character hexadecimal string, got {id:?}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32 bytes of the hash. Infallible: the id is validated hex.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, chunk) in self.0.as_bytes().chunks_exact(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = (chunk[1] as char).to_digit(16).unwrap_or(0) as u8;
            bytes[i] = (hi << 4) | lo;
        }
        bytes
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = SubmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = SubmitterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

/// A payment channel is identified by the same 64-hex format as a transaction.
pub type ChannelId = TransactionId;

/// The fixed allow-list of transaction kinds the pipeline will submit.
///
/// Parsing an unknown kind string fails, which is the allow-list check for
/// callers that receive kinds over a wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TransactionKind {
    Payment,
    PaymentChannelCreate,
    PaymentChannelFund,
    PaymentChannelClaim,
}

impl TransactionKind {
    /// Parses a kind name, rejecting anything outside the allow-list.
    pub fn parse(kind: &str) -> Result<Self, SubmitterError> {
        kind.parse()
            .map_err(|_| SubmitterError::InvalidKind(kind.to_string()))
    }
}

/// Parameters for a plain payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentParams {
    pub destination: String,
    /// Amount in drops.
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_tag: Option<u32>,
}

/// Parameters for opening a payment channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCreateParams {
    pub destination: String,
    /// Amount in drops locked into the channel.
    pub amount: u64,
    /// Seconds the source must wait after requesting close before the channel
    /// expires.
    pub settle_delay: u32,
    /// Public key authorized to sign claims against the channel.
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_tag: Option<u32>,
}

/// Parameters for topping up an existing channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelFundParams {
    pub channel: ChannelId,
    /// Amount in drops added to the channel.
    pub amount: u64,
}

/// Parameters for settling a claim against a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelClaimParams {
    pub channel: ChannelId,
    /// Channel balance (in drops) asserted by the claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default)]
    pub close: bool,
}

/// One submittable transaction: a kind plus its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "camelCase")]
pub enum TransactionRequest {
    Payment(PaymentParams),
    PaymentChannelCreate(ChannelCreateParams),
    PaymentChannelFund(ChannelFundParams),
    PaymentChannelClaim(ChannelClaimParams),
}

impl TransactionRequest {
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionRequest::Payment(_) => TransactionKind::Payment,
            TransactionRequest::PaymentChannelCreate(_) => TransactionKind::PaymentChannelCreate,
            TransactionRequest::PaymentChannelFund(_) => TransactionKind::PaymentChannelFund,
            TransactionRequest::PaymentChannelClaim(_) => TransactionKind::PaymentChannelClaim,
        }
    }
}

/// Submission instructions attached to a prepared transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInstructions {
    /// Last ledger version in which the transaction may still validate.
    pub max_ledger_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
}

/// An unsigned transaction as returned by a prepare-builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    /// Serialized unsigned transaction instructions.
    pub tx_json: String,
    pub instructions: TransactionInstructions,
}

/// A signed transaction blob plus the hash it will have on the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub id: TransactionId,
    pub signed_transaction: String,
}

/// A ledger engine result code (`tesSUCCESS`, `temBAD_FEE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(String);

impl ResultCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff the transaction was applied successfully.
    pub fn is_success(&self) -> bool {
        self.0 == SUCCESS_RESULT_CODE
    }

    /// True iff the code marks a structurally malformed transaction, which
    /// can never achieve finality and must not be waited on.
    pub fn is_malformed(&self) -> bool {
        self.0.starts_with(MALFORMED_RESULT_PREFIX)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResultCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// Preliminary result returned by the ledger node on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub result_code: ResultCode,
    pub result_message: String,
}

/// Final outcome of a transaction as recorded on the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    pub result: ResultCode,
    /// Ledger version the transaction validated in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_version: Option<u32>,
}

/// Asynchronous notifications consumed by the finality tracker.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    /// A transaction was included in a validated ledger.
    TransactionValidated {
        hash: TransactionId,
        result: ResultCode,
        ledger_version: u32,
    },
    /// A new ledger closed.
    LedgerClosed { ledger_version: u32 },
}
