//! In-memory message store.

use std::sync::{PoisonError, RwLock};

/// Append-only collection of the records written to the hub.
///
/// Every `add` happens under the write lock, so a concurrent `get_all`
/// sees either all of an append or none of it.
#[derive(Debug, Default)]
pub struct MessageStore {
    records: RwLock<Vec<serde_json::Value>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. No deduplication.
    pub fn add(&self, record: serde_json::Value) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        tracing::debug!(total = records.len(), "record appended");
    }

    /// Snapshot of every record in insertion order.
    pub fn get_all(&self) -> Vec<serde_json::Value> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
