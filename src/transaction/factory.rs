//! Creation and crash recovery of durable transactions.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{pending_index, Transaction, TransactionStorage};
use crate::constants::PENDING_TRANSACTIONS_KEY;
use crate::models::{SubmitterError, TransactionId};
use crate::store::Store;

/// Creates new durable transactions and rehydrates pending ones on startup.
///
/// All transactions produced by one factory share a single write queue, which
/// totally orders their store writes.
#[derive(Clone)]
pub struct TransactionFactory {
    storage: TransactionStorage,
}

impl TransactionFactory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            storage: TransactionStorage {
                store,
                write_queue: Arc::new(Mutex::new(())),
            },
        }
    }

    /// Constructs a new unsaved transaction.
    ///
    /// Fails with a duplicate error if a record already exists under `id` —
    /// the double-submission guard.
    pub async fn create(
        &self,
        id: &str,
        details: &str,
        pending: bool,
    ) -> Result<Transaction, SubmitterError> {
        let id = TransactionId::new(id)?;
        if self.storage.store.get(id.as_str()).await?.is_some() {
            return Err(SubmitterError::DuplicateTransaction(id));
        }
        Ok(Transaction::with_storage(
            id,
            details.to_string(),
            pending,
            self.storage.clone(),
        ))
    }

    /// Rehydrates every transaction listed in the pending index, in index
    /// order, each marked pending. This is the crash-recovery entry point:
    /// on process start the caller re-submits or re-verifies the result.
    ///
    /// Returns an empty set when no index record exists. An id listed in the
    /// index without a stored details record is store corruption and surfaces
    /// as a validation error.
    pub async fn load_all_pending(&self) -> Result<Vec<Transaction>, SubmitterError> {
        let Some(index) = self.storage.store.get(PENDING_TRANSACTIONS_KEY).await? else {
            return Ok(Vec::new());
        };

        let mut transactions = Vec::new();
        for id in pending_index::ids(&index) {
            let details = self.storage.store.get(id).await?.ok_or_else(|| {
                SubmitterError::ValidationError(format!(
                    "pending index references id {id} with no stored details"
                ))
            })?;
            transactions.push(Transaction::with_storage(
                TransactionId::new(id)?,
                details,
                true,
                self.storage.clone(),
            ));
        }
        debug!(count = transactions.len(), "loaded pending transactions");
        Ok(transactions)
    }
}
