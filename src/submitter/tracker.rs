//! Finality detection for submitted transactions.
//!
//! The tracker correlates in-flight transactions against the two asynchronous
//! notification sources: per-transaction validation events and per-ledger
//! close events. Whichever source wins resolves the caller's completion
//! handle exactly once; terminal states always delete the transaction's
//! durable record.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::pending::{FinalityResult, PendingEntry, PendingTransactions};
use crate::ledger::{LedgerClient, LedgerVersionRange};
use crate::models::{
    LedgerError, LedgerEvent, ResultCode, SubmitterError, TransactionId, TransactionOutcome,
};

pub(crate) struct FinalityTracker<C: LedgerClient> {
    client: Arc<C>,
    /// Full-history node queried only when the primary lacks ledger history;
    /// connected for the duration of one lookup at a time.
    fallback_client: Arc<C>,
    pending: Arc<Mutex<PendingTransactions>>,
}

impl<C: LedgerClient + 'static> FinalityTracker<C> {
    pub fn spawn(
        client: Arc<C>,
        fallback_client: Arc<C>,
        pending: Arc<Mutex<PendingTransactions>>,
        events: mpsc::UnboundedReceiver<LedgerEvent>,
    ) -> JoinHandle<()> {
        let tracker = Self {
            client,
            fallback_client,
            pending,
        };
        tokio::spawn(tracker.run(events))
    }

    async fn run(self, mut events: mpsc::UnboundedReceiver<LedgerEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LedgerEvent::TransactionValidated {
                    hash,
                    result,
                    ledger_version,
                } => self.handle_validated(hash, result, ledger_version).await,
                LedgerEvent::LedgerClosed { ledger_version } => {
                    self.handle_ledger_closed(ledger_version).await
                }
            }
        }
        debug!("ledger event stream closed, finality tracker stopping");
    }

    /// A validated-transaction notification: if the hash is one of ours,
    /// settle it on the reported engine result.
    async fn handle_validated(&self, hash: TransactionId, result: ResultCode, ledger_version: u32) {
        let Some(entry) = self.pending.lock().take(&hash) else {
            return;
        };

        let outcome = if result.is_success() {
            Ok(TransactionOutcome {
                result,
                ledger_version: Some(ledger_version),
            })
        } else {
            Err(SubmitterError::TransactionFailed { code: result })
        };
        self.finalize(entry, outcome).await;
    }

    /// A ledger closed: every transaction whose validity window ended at or
    /// before this version can no longer validate through the event path, so
    /// its outcome is queried directly.
    async fn handle_ledger_closed(&self, ledger_version: u32) {
        let expired = self.pending.lock().take_expired(ledger_version);
        if expired.is_empty() {
            return;
        }
        debug!(
            ledger_version,
            count = expired.len(),
            "validity window passed for pending transactions, querying outcomes"
        );
        for entry in expired {
            let outcome = self.query_outcome(&entry).await;
            self.finalize(entry, outcome).await;
        }
    }

    async fn query_outcome(&self, entry: &PendingEntry) -> FinalityResult {
        let id = entry.transaction.id();
        let range = LedgerVersionRange {
            min_ledger_version: entry.min_ledger_version,
            max_ledger_version: entry.max_ledger_version,
        };

        let looked_up = match self.client.get_transaction(id, range).await {
            Err(LedgerError::MissingLedgerHistory(reason)) => {
                debug!(
                    tx_id = %id,
                    reason = %reason,
                    "primary node lacks ledger history, querying full-history node"
                );
                self.query_fallback(id, range).await
            }
            other => other,
        };

        match looked_up {
            Ok(outcome) if outcome.result.is_success() => Ok(outcome),
            Ok(outcome) => Err(SubmitterError::TransactionFailed {
                code: outcome.result,
            }),
            Err(LedgerError::NotFound(_)) => Err(SubmitterError::NotFound(id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    /// Scoped use of the full-history node: connect, query, and always
    /// disconnect, regardless of the query result.
    async fn query_fallback(
        &self,
        id: &TransactionId,
        range: LedgerVersionRange,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.fallback_client.connect().await?;
        let result = self.fallback_client.get_transaction(id, range).await;
        if let Err(err) = self.fallback_client.disconnect().await {
            warn!(error = %err, "failed to disconnect full-history ledger client");
        }
        result
    }

    /// Terminal state: drop the durable record, then settle the caller.
    async fn finalize(&self, entry: PendingEntry, outcome: FinalityResult) {
        let tx_id = entry.transaction.id().clone();
        if let Err(err) = entry.transaction.delete().await {
            warn!(
                tx_id = %tx_id,
                error = %err,
                "failed to delete finalized transaction from store"
            );
        }
        match &outcome {
            Ok(outcome) => info!(
                tx_id = %tx_id,
                result = %outcome.result,
                ledger_version = ?outcome.ledger_version,
                "transaction finalized"
            ),
            Err(err) => warn!(tx_id = %tx_id, error = %err, "transaction failed"),
        }
        entry.completion.complete(outcome);
    }
}
