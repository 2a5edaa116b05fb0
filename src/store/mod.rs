//! # Store Module
//!
//! Key/value persistence interface consumed by the transaction ledger. The
//! backing store is external infrastructure; this module defines the contract
//! it must honor (last-write-wins per key) and ships an in-memory
//! implementation used by tests and by hosts without a durable backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::models::StoreError;

#[cfg(test)]
use mockall::automock;

/// Asynchronous key/value persistence.
///
/// All operations may suspend. Implementations must preserve last-write-wins
/// ordering per key for the callers' writes to be meaningful; cross-key write
/// ordering is imposed by the transaction write queue, not the store.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store backed by a hash map.
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.remove(key);
        Ok(())
    }
}
