//! In-memory store backend.
//!
//! Records are held as bincode-encoded bytes behind a mutex, matching the
//! shape a persistent keyed backend would have. Thread-safe for use with
//! tokio's multi-threaded runtime.

use crate::error::StoreError;
use crate::ActionStore;
use acta_types::{ActionDescriptor, ActionId, ActionRecord, ParticipantId, Timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

/// Default in-process backend.
pub struct MemoryActionStore {
    records: Mutex<HashMap<ActionId, Vec<u8>>>,
}

impl MemoryActionStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn decode(bytes: &[u8]) -> Result<ActionRecord, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn encode(record: &ActionRecord) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(record).map_err(|e| StoreError::Codec(e.to_string()))
    }
}

impl Default for MemoryActionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStore for MemoryActionStore {
    fn get(&self, id: &ActionId) -> Result<Option<ActionRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        records.get(id).map(|b| Self::decode(b)).transpose()
    }

    fn insert(&self, record: &ActionRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.id()) {
            return Err(StoreError::AlreadyExists(record.id().to_string()));
        }
        records.insert(record.id(), Self::encode(record)?);
        Ok(())
    }

    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: &ActionRecord,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let stored = records
            .get(&record.id())
            .ok_or_else(|| StoreError::NotFound(record.id().to_string()))?;
        let stored_version = Self::decode(stored)?.version;
        if stored_version != expected_version {
            return Err(StoreError::VersionConflict {
                id: record.id().to_string(),
                expected: expected_version,
                stored: stored_version,
            });
        }
        records.insert(record.id(), Self::encode(record)?);
        Ok(())
    }

    fn scan(
        &self,
        cursor: Option<&(Timestamp, ActionId)>,
        limit: usize,
    ) -> Result<Vec<ActionRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut all: Vec<ActionRecord> = records
            .values()
            .map(|b| Self::decode(b))
            .collect::<Result<_, _>>()?;
        all.sort_by_key(|r| (r.request.metadata.created_at, r.id()));
        let slice: Vec<ActionRecord> = all
            .into_iter()
            .filter(|r| match cursor {
                Some(&(ts, id)) => (r.request.metadata.created_at, r.id()) > (ts, id),
                None => true,
            })
            .take(limit)
            .collect();
        Ok(slice)
    }

    fn count_since(
        &self,
        initiator: &ParticipantId,
        descriptor: &ActionDescriptor,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        let records = self.records.lock().unwrap();
        let mut count = 0u64;
        for bytes in records.values() {
            let record = Self::decode(bytes)?;
            if record.request.initiator == *initiator
                && record.request.descriptor == *descriptor
                && record.request.metadata.created_at >= since
            {
                count += 1;
            }
        }
        Ok(count)
    }
}
