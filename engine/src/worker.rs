//! Background tasks: the ledger worker and the periodic sweeps.
//!
//! The ledger worker drains a queue of approved actions awaiting their
//! ledger write, retrying transient failures with exponential backoff. The
//! expiry sweep moves overdue pending actions to `Expired` so their state
//! does not depend on someone fetching them. The reconcile sweep re-queues
//! approved actions whose ledger write is still outstanding; the recovery
//! path after a crash or a retry budget exhausted during an outage.

use crate::engine::Engine;
use crate::error::EngineError;
use crate::shutdown::ShutdownSignal;
use acta_audit::LedgerError;
use acta_types::{ActionId, ActionStatus, AuditState};
use acta_verification::{apply_expiry, ActionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

impl Engine {
    /// Spawn the ledger worker and both sweeps. Call once; a second call is
    /// a no-op because the ledger receiver has already been taken.
    pub fn start(self: &Arc<Self>) {
        let Some(rx) = self.ledger_rx.lock().unwrap().take() else {
            return;
        };

        tokio::spawn(self.clone().ledger_worker(rx, self.shutdown.subscribe()));
        tokio::spawn(self.clone().expiry_loop(self.shutdown.subscribe()));
        tokio::spawn(self.clone().reconcile_loop(self.shutdown.subscribe()));
        tracing::info!("engine background tasks started");
    }

    async fn ledger_worker(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<ActionId>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                id = rx.recv() => match id {
                    Some(id) => {
                        if let Err(e) = self.process_ledger_entry(&id).await {
                            tracing::warn!(id = %id, error = %e, "ledger job failed");
                        }
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("ledger worker stopped");
    }

    async fn expiry_loop(self: Arc<Self>, mut shutdown: ShutdownSignal) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.expiry_sweep_secs));
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.run_expiry_sweep().await {
                        tracing::warn!(error = %e, "expiry sweep failed");
                    }
                }
            }
        }
    }

    async fn reconcile_loop(self: Arc<Self>, mut shutdown: ShutdownSignal) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.reconcile_secs));
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.run_reconcile_sweep() {
                        tracing::warn!(error = %e, "reconcile sweep failed");
                    }
                }
            }
        }
    }

    /// Record one approved action on the ledger and complete it.
    ///
    /// Idempotent and safe to call for any action: anything not approved
    /// with an outstanding ledger write is skipped. Transient ledger errors
    /// are retried with exponential backoff up to the configured budget;
    /// past the budget the action stays `Approved`/`AuditState::Pending`
    /// for the reconcile sweep. A permanent error marks the audit state
    /// failed without touching the approval.
    pub async fn process_ledger_entry(&self, id: &ActionId) -> Result<(), EngineError> {
        let mut attempt = 0u32;
        loop {
            // Snapshot under the lock; the write itself runs without it, so
            // a slow ledger never blocks reads or submissions for this
            // action. An approved record's digest-relevant fields are frozen,
            // so the snapshot stays accurate for the duration of the write.
            let snapshot = {
                let _guard = self.locks.acquire(*id).await;
                let record = self.registry.get(id)?;
                if record.status != ActionStatus::Approved
                    || record.audit_state != AuditState::Pending
                {
                    return Ok(());
                }
                record
            };

            let transient = match self.recorder.record(&snapshot) {
                Ok(receipt) => {
                    let _guard = self.locks.acquire(*id).await;
                    let mut record = self.registry.get(id)?;
                    // A concurrent job for the same id may have finished
                    // first; the ledger write was idempotent either way.
                    if record.status != ActionStatus::Approved
                        || record.audit_state != AuditState::Pending
                    {
                        return Ok(());
                    }
                    record.result_payload = Some(
                        serde_json::json!({
                            "ledger_reference": receipt.reference,
                            "recorded_at": receipt.recorded_at.as_secs(),
                        })
                        .to_string(),
                    );
                    record.ledger_receipt = Some(receipt);
                    record.audit_state = AuditState::Recorded;
                    record.status = ActionStatus::Completed;
                    self.persist(&mut record)?;
                    self.on_completed(&record);
                    return Ok(());
                }
                Err(LedgerError::Permanent(reason)) => {
                    tracing::error!(id = %id, reason = %reason, "ledger rejected action record");
                    let _guard = self.locks.acquire(*id).await;
                    let mut record = self.registry.get(id)?;
                    if record.audit_state == AuditState::Pending {
                        record.audit_state = AuditState::Failed {
                            reason: reason.clone(),
                        };
                        self.persist(&mut record)?;
                    }
                    return Err(LedgerError::Permanent(reason).into());
                }
                Err(LedgerError::Transient(reason)) => reason,
            };

            attempt += 1;
            if attempt > self.config.ledger_max_retries {
                tracing::warn!(
                    id = %id,
                    attempts = attempt,
                    "ledger still unavailable, leaving action for reconcile sweep"
                );
                return Err(LedgerError::Transient(transient).into());
            }
            let delay = self.config.ledger_retry_base_ms << (attempt - 1).min(6);
            tracing::debug!(id = %id, attempt, delay_ms = delay, "retrying ledger write");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Walk the store and expire overdue pending actions. Returns how many
    /// were expired.
    pub async fn run_expiry_sweep(&self) -> Result<u64, EngineError> {
        let now = self.clock.now();
        let mut cursor = None;
        let mut expired = 0u64;
        loop {
            let page = self.store.scan(cursor.as_ref(), self.config.query_page_size)?;
            let full_page = page.len() == self.config.query_page_size;
            if let Some(last) = page.last() {
                cursor = Some((last.request.metadata.created_at, last.id()));
            }
            for candidate in page {
                if candidate.status != ActionStatus::Pending || !candidate.past_deadline(now) {
                    continue;
                }
                // Re-read under the lock; a submission may have won the race.
                let _guard = self.locks.acquire(candidate.id()).await;
                let mut record = self.registry.get(&candidate.id())?;
                if apply_expiry(&mut record, now) {
                    self.persist(&mut record)?;
                    self.dispatch(&record, &[ActionEvent::Expired { id: record.id() }]);
                    expired += 1;
                }
            }
            if !full_page {
                break;
            }
        }
        if expired > 0 {
            tracing::info!(expired, "expiry sweep done");
        }
        Ok(expired)
    }

    /// Re-queue approved actions whose ledger write is outstanding. Returns
    /// how many were queued.
    pub fn run_reconcile_sweep(&self) -> Result<u64, EngineError> {
        let mut cursor = None;
        let mut queued = 0u64;
        loop {
            let page = self.store.scan(cursor.as_ref(), self.config.query_page_size)?;
            let full_page = page.len() == self.config.query_page_size;
            if let Some(last) = page.last() {
                cursor = Some((last.request.metadata.created_at, last.id()));
            }
            for record in page {
                if record.status == ActionStatus::Approved
                    && record.audit_state == AuditState::Pending
                    && self.ledger_tx.send(record.id()).is_ok()
                {
                    queued += 1;
                }
            }
            if !full_page {
                break;
            }
        }
        if queued > 0 {
            tracing::info!(queued, "reconcile sweep re-queued ledger jobs");
        }
        Ok(queued)
    }
}
