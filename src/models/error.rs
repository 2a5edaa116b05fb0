//! Error taxonomy for the submission pipeline and its collaborators.
//!
//! Each layer surfaces its own `thiserror` enum; the caller-facing
//! `SubmitterError` aggregates them and classifies which conditions are
//! transient.

use thiserror::Error;

use crate::models::{ChannelId, ResultCode, TransactionId};

/// Errors surfaced by the persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by a ledger client.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("connection error: {0}")]
    Connection(String),

    /// The queried node has pruned or never ingested the requested ledger
    /// range. Recoverable by querying a full-history node.
    #[error("missing ledger history: {0}")]
    MissingLedgerHistory(String),

    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl LedgerError {
    /// Determines if this error is transient (can retry) or permanent.
    ///
    /// `MissingLedgerHistory` is transient in the sense that a node with more
    /// history can answer the same query; `NotFound` and `Signing` are
    /// definitive.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LedgerError::Connection(_)
                | LedgerError::MissingLedgerHistory(_)
                | LedgerError::Rpc(_)
        )
    }
}

/// Caller-facing errors of the submission pipeline.
#[derive(Error, Debug)]
pub enum SubmitterError {
    #[error("transaction validation error: {0}")]
    ValidationError(String),

    #[error("invalid transaction kind: {0}")]
    InvalidKind(String),

    #[error("transaction exists already. id={0}")]
    DuplicateTransaction(TransactionId),

    /// The ledger rejected the submission as structurally malformed. Nothing
    /// was left behind in the store and no finality will be awaited.
    #[error("malformed transaction: {code} {message}")]
    MalformedTransaction { code: ResultCode, message: String },

    /// The transaction reached finality with a non-success result.
    #[error("transaction failed: {code}")]
    TransactionFailed { code: ResultCode },

    /// The transaction's validity window passed and the ledger has no record
    /// of it.
    #[error("transaction not found on ledger. id={0}")]
    NotFound(TransactionId),

    /// The submission worker is gone; no further submissions can be processed.
    #[error("submission pipeline closed")]
    PipelineClosed,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitterError {
    /// Determines if this error is transient (the same submission may be
    /// retried by the caller) or permanent.
    ///
    /// **Transient:**
    /// - `Ledger`: delegates to the underlying error's classification
    /// - `Store`: backend hiccups may resolve on retry
    /// - `PipelineClosed`: a fresh submitter can process the request
    ///
    /// **Permanent:**
    /// - `ValidationError`, `InvalidKind`: malformed input will not change
    /// - `DuplicateTransaction`: the id is already taken
    /// - `MalformedTransaction`: the ledger will reject it again
    /// - `TransactionFailed`, `NotFound`: finality is final
    pub fn is_transient(&self) -> bool {
        match self {
            SubmitterError::Ledger(err) => err.is_transient(),
            SubmitterError::Store(_) => true,
            SubmitterError::PipelineClosed => true,
            SubmitterError::ValidationError(_)
            | SubmitterError::InvalidKind(_)
            | SubmitterError::DuplicateTransaction(_)
            | SubmitterError::MalformedTransaction { .. }
            | SubmitterError::TransactionFailed { .. }
            | SubmitterError::NotFound(_) => false,
        }
    }
}

/// Errors surfaced by the channel-expiry watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("invalid channel id: {0}")]
    InvalidChannel(String),

    #[error("channel {0} does not exist")]
    ChannelNotFound(ChannelId),

    #[error("channel {channel} has a settle delay shorter than the configured poll interval")]
    SettleDelayTooShort { channel: ChannelId },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
