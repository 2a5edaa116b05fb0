//! # xrpl-paychan-submitter
//!
//! Submission and finality verification for XRPL payment-channel
//! transactions. The crate submits signed ledger transactions
//! (payment-channel creation, funding, claim settlement, and plain payments)
//! and reliably determines their final outcome, surviving process restarts
//! and temporary unavailability of the queried ledger node.
//!
//! ## Architecture
//!
//! - [`submitter::TxSubmitter`] — the serialized submission pipeline: one
//!   build → sign → persist → submit unit per call, strictly FIFO per signing
//!   address, with a finality tracker correlating submissions against
//!   validated-transaction and ledger-closed events (falling back to a
//!   full-history node when the primary lacks ledger history).
//! - [`transaction::Transaction`] / [`transaction::TransactionFactory`] — the
//!   durable pending-transaction ledger and its crash-recovery entry point.
//! - [`store::Store`] — the consumed key/value persistence interface.
//! - [`ledger::LedgerClient`] — the consumed network-facing client interface.
//! - [`watcher::ChannelWatcher`] — the independent channel-expiry poller.
//! - [`utils`] — channel-id derivation, claim encoding and amount helpers.

pub mod constants;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod store;
pub mod submitter;
pub mod transaction;
pub mod utils;
pub mod watcher;

pub use ledger::{LedgerClient, LedgerVersionRange};
pub use models::{
    ChannelClaimParams, ChannelCloseEvent, ChannelCreateParams, ChannelFundParams, ChannelId,
    LedgerError, LedgerEvent, PaymentChannel, PaymentParams, PreparedTransaction, ResultCode,
    SignedTransaction, StoreError, SubmitResult, SubmitterError, TransactionId,
    TransactionInstructions, TransactionKind, TransactionOutcome, TransactionRequest,
    WatcherError,
};
pub use store::{InMemoryStore, Store};
pub use submitter::{SubmitterConfig, SubmitterRegistry, TxSubmitter};
pub use transaction::{Transaction, TransactionFactory};
pub use watcher::ChannelWatcher;
