//! The `submit` transition and expiry handling.

use crate::authorize::authorize;
use crate::completion::is_satisfied;
use crate::error::VerificationError;
use crate::events::ActionEvent;
use acta_types::{
    ActionRecord, ActionStatus, AuditState, ParticipantId, Timestamp, VerificationRecord,
};
use std::collections::BTreeSet;

/// Transition a still-pending record past its deadline to `Expired`.
///
/// Returns `true` when the record was mutated (the caller must persist it).
/// Safe to call on any record; non-pending and in-date records are left
/// untouched. An expired action can never be resurrected.
pub fn apply_expiry(record: &mut ActionRecord, now: Timestamp) -> bool {
    if record.status == ActionStatus::Pending && record.past_deadline(now) {
        record.status = ActionStatus::Expired;
        record.completed_at = Some(now);
        tracing::info!(id = %record.id(), "action expired");
        return true;
    }
    false
}

/// Apply one verification submission to the record.
///
/// On success the record is mutated (a verification record is always
/// appended; approvals and rejections alike) and the resulting lifecycle
/// events are returned for the caller to dispatch after persisting. On
/// error the record is unchanged.
///
/// `ledger_required` is decided by the caller from governance policy; when
/// set, a satisfied action stays `Approved` with `AuditState::Pending` until
/// the ledger worker completes it. Otherwise it completes immediately.
///
/// The caller is responsible for serializing concurrent submissions per
/// action id; this function assumes exclusive access to `record`.
pub fn submit(
    record: &mut ActionRecord,
    verifier: &ParticipantId,
    verifier_roles: &BTreeSet<String>,
    approved: bool,
    signature: Vec<u8>,
    notes: Option<String>,
    ledger_required: bool,
    now: Timestamp,
) -> Result<Vec<ActionEvent>, VerificationError> {
    // Deadline check comes first: a submission racing the expiry sweep must
    // observe the same outcome regardless of which ran.
    if apply_expiry(record, now) {
        return Err(VerificationError::AlreadyFinalized {
            status: ActionStatus::Expired,
        });
    }
    if record.status != ActionStatus::Pending {
        return Err(VerificationError::AlreadyFinalized {
            status: record.status,
        });
    }

    authorize(
        &record.request.requirement,
        &record.verifications,
        verifier,
        verifier_roles,
    )?;

    record.verifications.push(VerificationRecord {
        verifier: verifier.clone(),
        timestamp: now,
        signature,
        approved,
        notes,
    });

    let id = record.id();
    let mut events = Vec::new();

    if !approved {
        // An explicit rejection is final regardless of approvals already
        // recorded.
        record.status = ActionStatus::Rejected;
        record.completed_at = Some(now);
        events.push(ActionEvent::Rejected {
            id,
            verifier: verifier.clone(),
        });
        tracing::info!(id = %id, verifier = %verifier, "action rejected");
        return Ok(events);
    }

    if !is_satisfied(&record.request.requirement, &record.verifications) {
        tracing::debug!(
            id = %id,
            approvals = record.approval_count(),
            quorum = record.request.requirement.quorum(),
            "verification recorded, requirement not yet satisfied"
        );
        return Ok(events);
    }

    record.status = ActionStatus::Approved;
    record.completed_at = Some(now);
    events.push(ActionEvent::Approved { id });

    if ledger_required {
        record.audit_state = AuditState::Pending;
        events.push(ActionEvent::LedgerPending { id });
    } else {
        record.status = ActionStatus::Completed;
        record.audit_state = AuditState::NotRequired;
        events.push(ActionEvent::Completed { id });
    }
    tracing::info!(id = %id, ledger_required, "action approved");

    Ok(events)
}
