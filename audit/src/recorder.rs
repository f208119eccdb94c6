//! Idempotent recording to the external ledger.

use crate::digest::canonical_digest;
use crate::error::LedgerError;
use acta_types::{ActionId, ActionRecord, ContentDigest, LedgerReceipt, ParticipantId};
use std::collections::HashMap;
use std::sync::Mutex;

/// The external immutable ledger, keyed by action id. Implementations must
/// be idempotent on `id`: a second write with the same digest returns the
/// original receipt without writing twice.
pub trait LedgerClient: Send + Sync {
    fn write(
        &self,
        id: &ActionId,
        digest: &ContentDigest,
        participants: &[ParticipantId],
    ) -> Result<LedgerReceipt, LedgerError>;
}

impl<T: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<T> {
    fn write(
        &self,
        id: &ActionId,
        digest: &ContentDigest,
        participants: &[ParticipantId],
    ) -> Result<LedgerReceipt, LedgerError> {
        (**self).write(id, digest, participants)
    }
}

/// Records finalized actions to the ledger, caching receipts so repeat calls
/// for the same action never reach the ledger at all.
///
/// The cache is an optimization over the ledger's idempotent write contract,
/// so dropping entries is always safe; it is emptied whenever it reaches
/// [`RECEIPT_CACHE_MAX`] entries.
pub struct AuditRecorder {
    client: Box<dyn LedgerClient>,
    receipts: Mutex<HashMap<ActionId, LedgerReceipt>>,
}

const RECEIPT_CACHE_MAX: usize = 1024;

impl AuditRecorder {
    pub fn new(client: Box<dyn LedgerClient>) -> Self {
        Self {
            client,
            receipts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a finalized action. Idempotent per action id.
    pub fn record(&self, record: &ActionRecord) -> Result<LedgerReceipt, LedgerError> {
        let id = record.id();
        if let Some(receipt) = self.receipts.lock().unwrap().get(&id) {
            return Ok(receipt.clone());
        }

        let digest = canonical_digest(record);
        let participants = participant_ids(record);
        let receipt = self.client.write(&id, &digest, &participants)?;
        tracing::info!(id = %id, reference = %receipt.reference, "audit record written");

        let mut receipts = self.receipts.lock().unwrap();
        if receipts.len() >= RECEIPT_CACHE_MAX {
            receipts.clear();
        }
        receipts.insert(id, receipt.clone());
        Ok(receipt)
    }
}

/// Everyone who touched the action: initiator first, then verifiers in
/// submission order.
fn participant_ids(record: &ActionRecord) -> Vec<ParticipantId> {
    let mut ids = Vec::with_capacity(1 + record.verifications.len());
    ids.push(record.request.initiator.clone());
    for verification in &record.verifications {
        ids.push(verification.verifier.clone());
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use acta_types::{
        ActionDescriptor, ActionMetadata, ActionRequest, ActorCategory, Priority, Timestamp,
        VerificationRequirement,
    };
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingLedger {
        writes: Arc<AtomicU32>,
    }

    impl LedgerClient for CountingLedger {
        fn write(
            &self,
            id: &ActionId,
            digest: &ContentDigest,
            _participants: &[ParticipantId],
        ) -> Result<LedgerReceipt, LedgerError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(LedgerReceipt {
                action: *id,
                digest: *digest,
                reference: format!("entry-{id}"),
                recorded_at: Timestamp::new(42),
            })
        }
    }

    fn record() -> ActionRecord {
        ActionRecord::pending(ActionRequest {
            id: ActionId::generate(),
            descriptor: ActionDescriptor::from("Transfer:Funds"),
            initiator: ParticipantId::from("alice"),
            category: ActorCategory::Individual,
            description: String::new(),
            params: BTreeMap::new(),
            metadata: ActionMetadata {
                created_at: Timestamp::new(1000),
                expires_at: None,
                priority: Priority::High,
                tags: vec![],
                domain: "financial".into(),
            },
            requirement: VerificationRequirement::single(),
            artifacts: vec![],
        })
    }

    #[test]
    fn record_twice_writes_once() {
        let writes = Arc::new(AtomicU32::new(0));
        let recorder = AuditRecorder::new(Box::new(CountingLedger {
            writes: writes.clone(),
        }));
        let rec = record();

        let first = recorder.record(&rec).unwrap();
        let second = recorder.record(&rec).unwrap();
        assert_eq!(first, second);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn receipt_cache_stays_bounded() {
        let writes = Arc::new(AtomicU32::new(0));
        let recorder = AuditRecorder::new(Box::new(CountingLedger {
            writes: writes.clone(),
        }));
        for _ in 0..=RECEIPT_CACHE_MAX {
            recorder.record(&record()).unwrap();
        }
        assert!(recorder.receipts.lock().unwrap().len() <= RECEIPT_CACHE_MAX);
    }

    #[test]
    fn distinct_actions_write_separately() {
        let writes = Arc::new(AtomicU32::new(0));
        let recorder = AuditRecorder::new(Box::new(CountingLedger {
            writes: writes.clone(),
        }));

        recorder.record(&record()).unwrap();
        recorder.record(&record()).unwrap();
        assert_eq!(writes.load(Ordering::SeqCst), 2);
    }
}
