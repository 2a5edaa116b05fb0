//! # Transaction Module
//!
//! The durably-persistable record of one submitted transaction. A
//! `Transaction` owns its save/delete against the store, including
//! maintenance of the pending-transaction index that anchors crash recovery.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::constants::PENDING_TRANSACTIONS_KEY;
use crate::models::{StoreError, SubmitterError, TransactionId};
use crate::store::Store;

mod factory;
pub use factory::TransactionFactory;

pub mod pending_index;

/// Shared persistence handle: the store plus the write queue that totally
/// orders `save`/`delete` critical sections across all transactions using it.
#[derive(Clone)]
pub(crate) struct TransactionStorage {
    pub store: Arc<dyn Store>,
    pub write_queue: Arc<Mutex<()>>,
}

/// A durably-persistable record of one submitted transaction.
///
/// Exists in the store's main key space iff `save` has been called more
/// recently than any `delete`; its id is listed in the pending index iff it is
/// currently tracked as pending.
#[derive(Clone)]
pub struct Transaction {
    id: TransactionId,
    details: String,
    pending: bool,
    storage: Option<TransactionStorage>,
}

impl Transaction {
    /// Constructs a store-less transaction. `save`/`delete` are no-ops.
    ///
    /// Fails if `id` is not a 64-hex-character string.
    pub fn new(
        id: &str,
        details: impl Into<String>,
        pending: bool,
    ) -> Result<Self, SubmitterError> {
        Ok(Self {
            id: TransactionId::new(id)?,
            details: details.into(),
            pending,
            storage: None,
        })
    }

    pub(crate) fn with_storage(
        id: TransactionId,
        details: String,
        pending: bool,
        storage: TransactionStorage,
    ) -> Self {
        Self {
            id,
            details,
            pending,
            storage: Some(storage),
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn set_details(&mut self, details: impl Into<String>) {
        self.details = details.into();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    /// Durably persists the transaction: adds its id to the pending index,
    /// then writes its details under its own key.
    ///
    /// Both writes happen inside one write-queue slot, so no other
    /// transaction's `save`/`delete` interleaves with them.
    pub async fn save(&self) -> Result<(), StoreError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let _write_slot = storage.write_queue.lock().await;

        let index = storage
            .store
            .get(PENDING_TRANSACTIONS_KEY)
            .await?
            .unwrap_or_default();
        let updated = pending_index::append_id(&index, self.id.as_str());
        if updated != index {
            storage.store.put(PENDING_TRANSACTIONS_KEY, &updated).await?;
        }
        storage.store.put(self.id.as_str(), &self.details).await?;
        debug!(tx_id = %self.id, "persisted transaction");
        Ok(())
    }

    /// Removes the transaction's record and drops its id from the pending
    /// index, under the same write-queue ordering as `save`.
    pub async fn delete(&self) -> Result<(), StoreError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let _write_slot = storage.write_queue.lock().await;

        storage.store.delete(self.id.as_str()).await?;
        let index = storage
            .store
            .get(PENDING_TRANSACTIONS_KEY)
            .await?
            .unwrap_or_default();
        let updated = pending_index::remove_id(&index, self.id.as_str());
        if updated != index {
            storage.store.put(PENDING_TRANSACTIONS_KEY, &updated).await?;
        }
        debug!(tx_id = %self.id, "deleted transaction");
        Ok(())
    }
}
