//! Action requests, records, and their lifecycle.
//!
//! An [`ActionRequest`] is immutable once created. The [`ActionRecord`] is
//! the mutable projection that accumulates verification records and walks
//! the status lifecycle:
//!
//! ```text
//! Pending ──► Approved ──► Completed
//!    │
//!    ├──► Rejected   (terminal)
//!    └──► Expired    (terminal)
//! ```
//!
//! `Rejected` and `Expired` are reached exactly once and never left.
//! `Approved` flows to `Completed` once post-approval side effects (ledger
//! recording) succeed, or immediately when no side effects are required.

use crate::category::ActorCategory;
use crate::descriptor::ActionDescriptor;
use crate::digest::ContentDigest;
use crate::id::{ActionId, ParticipantId};
use crate::param::ParamValue;
use crate::requirement::VerificationRequirement;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scheduling priority of an action. Ordering is semantic: `Critical`
/// outranks `High` outranks `Normal` outranks `Low`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Lifecycle status of an action record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Accumulating verifications.
    Pending,
    /// Verification requirement satisfied; post-approval side effects
    /// (ledger recording) may still be outstanding.
    Approved,
    /// Explicitly rejected by a verifier. Terminal.
    Rejected,
    /// Time constraint elapsed while still pending. Terminal.
    Expired,
    /// Approved and all required side effects done. Terminal.
    Completed,
}

impl ActionStatus {
    /// Whether no further `submit` may change this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Descriptive metadata attached to an action at creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub created_at: Timestamp,
    /// Absolute deadline; derived from the requirement's time constraint
    /// when not overridden by the caller.
    pub expires_at: Option<Timestamp>,
    pub priority: Priority,
    pub tags: Vec<String>,
    /// Business domain the action belongs to (e.g. `"financial"`). Used by
    /// query filters and the ledger-eligibility policy.
    pub domain: String,
}

/// Reference to a supporting artifact, with an integrity hash over its
/// content so the artifact store cannot silently substitute bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub uri: String,
    pub content_hash: ContentDigest,
}

/// An immutable, fully-resolved request for a governed action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRequest {
    pub id: ActionId,
    pub descriptor: ActionDescriptor,
    pub initiator: ParticipantId,
    /// Governance category the initiator acted under; fixed at creation so
    /// the audit retention policy cannot drift after the fact.
    pub category: ActorCategory,
    pub description: String,
    /// Typed parameter bag, key-sorted so the canonical digest is stable.
    pub params: BTreeMap<String, ParamValue>,
    pub metadata: ActionMetadata,
    /// The requirement resolved from governance policy at creation time.
    pub requirement: VerificationRequirement,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRef>,
}

/// A single verifier's approval or rejection. Append-only: once written,
/// never mutated or removed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub verifier: ParticipantId,
    pub timestamp: Timestamp,
    /// Opaque signature bytes produced by the verifier's client. Never
    /// interpreted by this engine.
    pub signature: Vec<u8>,
    pub approved: bool,
    pub notes: Option<String>,
}

/// Where the action stands with respect to external ledger recording.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditState {
    /// This action does not meet the ledger-eligibility policy.
    NotRequired,
    /// Awaiting a successful ledger write (retried in the background).
    Pending,
    /// Receipt obtained; the record is on the immutable ledger.
    Recorded,
    /// The ledger permanently rejected the digest. Needs operator attention;
    /// the approval itself stands.
    Failed { reason: String },
}

/// Proof-of-recording returned by the external immutable ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub action: ActionId,
    pub digest: ContentDigest,
    /// Ledger-assigned reference (entry hash, transaction id, …).
    pub reference: String,
    pub recorded_at: Timestamp,
}

/// The mutable projection of an [`ActionRequest`]: accumulated verifications
/// plus lifecycle state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRecord {
    pub request: ActionRequest,
    pub status: ActionStatus,
    /// Ordered, append-only list of verification records.
    pub verifications: Vec<VerificationRecord>,
    /// Set when the status first leaves `Pending`.
    pub completed_at: Option<Timestamp>,
    pub ledger_receipt: Option<LedgerReceipt>,
    pub audit_state: AuditState,
    /// Optional JSON payload attached by the completing side effect.
    pub result_payload: Option<String>,
    /// Store-level version for compare-and-swap; bumped on every mutation.
    pub version: u64,
}

impl ActionRecord {
    /// A fresh pending record for a newly created request.
    pub fn pending(request: ActionRequest) -> Self {
        Self {
            request,
            status: ActionStatus::Pending,
            verifications: Vec::new(),
            completed_at: None,
            ledger_receipt: None,
            audit_state: AuditState::NotRequired,
            result_payload: None,
            version: 0,
        }
    }

    pub fn id(&self) -> ActionId {
        self.request.id
    }

    /// Count of distinct approving verifications.
    pub fn approval_count(&self) -> u32 {
        self.verifications.iter().filter(|v| v.approved).count() as u32
    }

    /// Whether this record's time constraint has elapsed relative to `now`.
    /// Only meaningful while `Pending`.
    pub fn past_deadline(&self, now: Timestamp) -> bool {
        match self.request.metadata.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}
