//! Nullable ledger: records writes without an external ledger.

use acta_audit::{LedgerClient, LedgerError};
use acta_types::{ActionId, ContentDigest, LedgerReceipt, ParticipantId, Timestamp};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

/// A test ledger that stores entries in memory.
///
/// Failure injection: `fail_next_transient(n)` makes the next `n` writes
/// fail with a transient error, `fail_permanently()` makes every write fail
/// with a permanent one. Both reset with [`NullLedger::heal`].
#[derive(Default)]
pub struct NullLedger {
    entries: Mutex<HashMap<ActionId, (ContentDigest, LedgerReceipt)>>,
    attempts: AtomicU32,
    transient_failures_left: AtomicU32,
    permanent: Mutex<bool>,
    sequence: AtomicU64,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with a transient error.
    pub fn fail_next_transient(&self, n: u32) {
        self.transient_failures_left.store(n, Ordering::SeqCst);
    }

    /// Make every write fail with a permanent error until healed.
    pub fn fail_permanently(&self) {
        *self.permanent.lock().unwrap() = true;
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        self.transient_failures_left.store(0, Ordering::SeqCst);
        *self.permanent.lock().unwrap() = false;
    }

    /// Total write attempts, including failed ones (for assertions).
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of entries actually recorded.
    pub fn recorded(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// The receipt for an action, if recorded.
    pub fn receipt(&self, id: &ActionId) -> Option<LedgerReceipt> {
        self.entries.lock().unwrap().get(id).map(|(_, r)| r.clone())
    }
}

impl LedgerClient for NullLedger {
    fn write(
        &self,
        id: &ActionId,
        digest: &ContentDigest,
        _participants: &[ParticipantId],
    ) -> Result<LedgerReceipt, LedgerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if *self.permanent.lock().unwrap() {
            return Err(LedgerError::Permanent("ledger rejected entry".into()));
        }
        let left = self.transient_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.transient_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(LedgerError::Transient("ledger unavailable".into()));
        }

        let mut entries = self.entries.lock().unwrap();
        if let Some((stored_digest, receipt)) = entries.get(id) {
            // Idempotent on id, but only for the same content.
            if stored_digest == digest {
                return Ok(receipt.clone());
            }
            return Err(LedgerError::Permanent(format!(
                "conflicting digest for action {id}"
            )));
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let receipt = LedgerReceipt {
            action: *id,
            digest: *digest,
            reference: format!("null-ledger/{seq}"),
            recorded_at: Timestamp::now(),
        };
        entries.insert(*id, (*digest, receipt.clone()));
        Ok(receipt)
    }
}
