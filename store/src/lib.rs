//! Abstract storage for action records.
//!
//! The state machine never talks to a storage technology directly; it
//! depends on the [`ActionStore`] trait. Any persistent keyed store can back
//! it. The crate ships an in-memory implementation used as the default
//! backend and in tests.
//!
//! Scan ordering contract: records are returned ordered by
//! `(created_at, id)` ascending, and the order is stable across calls. Query
//! sequences in the registry rely on this for restartable pagination.

pub mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryActionStore;

use acta_types::{ActionDescriptor, ActionId, ActionRecord, ParticipantId, Timestamp};

/// Keyed store of action records with optimistic concurrency.
pub trait ActionStore: Send + Sync {
    /// Fetch a record by id.
    fn get(&self, id: &ActionId) -> Result<Option<ActionRecord>, StoreError>;

    /// Insert a brand-new record. Fails if the id already exists.
    fn insert(&self, record: &ActionRecord) -> Result<(), StoreError>;

    /// Replace an existing record iff the stored version equals
    /// `expected_version`. The caller bumps `record.version` before calling.
    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: &ActionRecord,
    ) -> Result<(), StoreError>;

    /// Page through records in `(created_at, id)` ascending order, starting
    /// strictly after `cursor`.
    fn scan(
        &self,
        cursor: Option<&(Timestamp, ActionId)>,
        limit: usize,
    ) -> Result<Vec<ActionRecord>, StoreError>;

    /// Count records by one initiator for one descriptor created at or after
    /// `since`. Backs the per-day/per-month quota counters.
    fn count_since(
        &self,
        initiator: &ParticipantId,
        descriptor: &ActionDescriptor,
        since: Timestamp,
    ) -> Result<u64, StoreError>;
}
