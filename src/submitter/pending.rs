//! In-memory tracking of in-flight transactions.
//!
//! Two maps, always mutated together: one keyed by transaction id holding the
//! caller's completion handle, one keyed by maximum valid ledger version so a
//! ledger close only inspects buckets that could have just expired.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::oneshot;
use tracing::warn;

use crate::models::{SubmitterError, TransactionId, TransactionOutcome};
use crate::transaction::Transaction;

pub(crate) type FinalityResult = Result<TransactionOutcome, SubmitterError>;

/// Single-fulfillment result slot for one transaction's finality.
///
/// `complete` consumes the handle, so a second write is unrepresentable.
pub(crate) struct CompletionHandle {
    sender: oneshot::Sender<FinalityResult>,
}

impl CompletionHandle {
    pub fn channel() -> (Self, oneshot::Receiver<FinalityResult>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    pub fn complete(self, result: FinalityResult) {
        if self.sender.send(result).is_err() {
            warn!("finality result dropped: caller no longer waiting");
        }
    }
}

/// One in-flight transaction awaiting finality.
pub(crate) struct PendingEntry {
    pub transaction: Transaction,
    /// Ledger version recorded before submission; lower bound for lookups.
    pub min_ledger_version: u32,
    /// Last ledger version the transaction may still validate in.
    pub max_ledger_version: u32,
    pub completion: CompletionHandle,
}

/// The paired pending maps. Every id present in the id map has an entry in
/// exactly one expiry bucket and vice versa; insertion and removal touch both.
#[derive(Default)]
pub(crate) struct PendingTransactions {
    by_id: HashMap<TransactionId, PendingEntry>,
    by_expiry: BTreeMap<u32, Vec<TransactionId>>,
}

impl PendingTransactions {
    /// Registers an in-flight transaction. The factory's duplicate guard
    /// makes a colliding id a logic error upstream.
    pub fn insert(&mut self, entry: PendingEntry) {
        let id = entry.transaction.id().clone();
        debug_assert!(
            !self.by_id.contains_key(&id),
            "transaction registered twice: {id}"
        );
        self.by_expiry
            .entry(entry.max_ledger_version)
            .or_default()
            .push(id.clone());
        self.by_id.insert(id, entry);
    }

    /// Removes and returns the entry for `id`, maintaining both maps.
    pub fn take(&mut self, id: &TransactionId) -> Option<PendingEntry> {
        let entry = self.by_id.remove(id)?;
        if let Some(bucket) = self.by_expiry.get_mut(&entry.max_ledger_version) {
            bucket.retain(|pending_id| pending_id != id);
            if bucket.is_empty() {
                self.by_expiry.remove(&entry.max_ledger_version);
            }
        }
        Some(entry)
    }

    /// Drains every entry whose validity window ends at or before
    /// `ledger_version`, maintaining both maps.
    pub fn take_expired(&mut self, ledger_version: u32) -> Vec<PendingEntry> {
        let expired_buckets: Vec<u32> = self
            .by_expiry
            .range(..=ledger_version)
            .map(|(version, _)| *version)
            .collect();

        let mut expired = Vec::new();
        for version in expired_buckets {
            let Some(ids) = self.by_expiry.remove(&version) else {
                continue;
            };
            for id in ids {
                if let Some(entry) = self.by_id.remove(&id) {
                    expired.push(entry);
                }
            }
        }
        expired
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
