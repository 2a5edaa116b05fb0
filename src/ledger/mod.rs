//! # Ledger Module
//!
//! Interface to the network-facing ledger client consumed by the submission
//! pipeline, the finality tracker and the channel watcher. The concrete
//! client (websocket connection, wire protocol, transaction encoding) is
//! external infrastructure; this module defines the operations the core
//! needs from it.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{
    ChannelClaimParams, ChannelCreateParams, ChannelFundParams, ChannelId, LedgerError,
    LedgerEvent, PaymentChannel, PaymentParams, PreparedTransaction, SignedTransaction,
    SubmitResult, TransactionId, TransactionOutcome,
};

#[cfg(test)]
use mockall::automock;

/// Ledger version range bounding a transaction lookup.
///
/// `min_ledger_version` is the version the submitter recorded before
/// submission; `max_ledger_version` is the transaction's validity bound. A
/// node that has this full range and finds nothing can assert the transaction
/// will never validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerVersionRange {
    pub min_ledger_version: u32,
    pub max_ledger_version: u32,
}

/// Network-facing ledger client.
///
/// One primary instance serves submission and event notification; a secondary
/// instance pointed at a full-history node serves fallback lookups only and
/// is connected just for the duration of a query.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait LedgerClient: Send + Sync {
    async fn connect(&self) -> Result<(), LedgerError>;
    async fn disconnect(&self) -> Result<(), LedgerError>;
    fn is_connected(&self) -> bool;

    /// Subscribes to validated-transaction notifications for `address`.
    /// Must be re-issued after every reconnect; implementations keep the
    /// event channel alive across reconnects.
    async fn subscribe_to_account(&self, address: &str) -> Result<(), LedgerError>;

    /// The stream of validated-transaction and ledger-closed notifications.
    /// Taken once by the finality tracker at construction.
    fn events(&self) -> mpsc::UnboundedReceiver<LedgerEvent>;

    /// Highest ledger version known to the client.
    fn ledger_version(&self) -> u32;

    async fn prepare_payment(
        &self,
        address: &str,
        params: &PaymentParams,
    ) -> Result<PreparedTransaction, LedgerError>;

    async fn prepare_channel_create(
        &self,
        address: &str,
        params: &ChannelCreateParams,
    ) -> Result<PreparedTransaction, LedgerError>;

    async fn prepare_channel_fund(
        &self,
        address: &str,
        params: &ChannelFundParams,
    ) -> Result<PreparedTransaction, LedgerError>;

    async fn prepare_channel_claim(
        &self,
        address: &str,
        params: &ChannelClaimParams,
    ) -> Result<PreparedTransaction, LedgerError>;

    /// Signs a prepared transaction with the given secret, yielding the
    /// signed blob and the hash it will carry on the ledger.
    fn sign(&self, tx_json: &str, secret: &str) -> Result<SignedTransaction, LedgerError>;

    /// Submits a signed blob, returning the node's preliminary result.
    async fn submit(&self, signed_transaction: &str) -> Result<SubmitResult, LedgerError>;

    /// Looks up a transaction's final outcome within a ledger range.
    ///
    /// Fails with [`LedgerError::NotFound`] when the range is fully available
    /// and holds no such transaction, and with
    /// [`LedgerError::MissingLedgerHistory`] when the node cannot see the
    /// whole range.
    async fn get_transaction(
        &self,
        id: &TransactionId,
        range: LedgerVersionRange,
    ) -> Result<TransactionOutcome, LedgerError>;

    /// Looks up the on-ledger state of a payment channel.
    async fn get_payment_channel(
        &self,
        channel_id: &ChannelId,
    ) -> Result<PaymentChannel, LedgerError>;
}
