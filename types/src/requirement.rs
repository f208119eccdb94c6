//! Verification requirements: how many approvals an action needs and from whom.
//!
//! Invariants are enforced at construction: a `Sequential` requirement must
//! name at least one participant (order matters), and a `Majority`
//! requirement must have a derivable quorum. A requirement that violates
//! these can never exist at runtime.

use crate::id::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// The shape of a verification requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementKind {
    /// One approval from any qualified verifier suffices.
    Single,
    /// A fixed number of approvals from qualified verifiers.
    Multi,
    /// Named participants must approve in declared order.
    Sequential,
    /// A quorum of the named participants, in any order.
    Majority,
}

/// Errors raised by requirement constructors and load-time validation.
#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("sequential requirement must name at least one participant")]
    EmptySequence,

    #[error("majority requirement needs participants or an explicit quorum")]
    UnderivableQuorum,

    #[error("minimum approvals must be at least 1 (got 0)")]
    ZeroQuorum,
}

/// What must happen before an action counts as approved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequirement {
    pub kind: RequirementKind,
    /// Roles qualifying a verifier (Single/Multi). Empty means unset.
    #[serde(default)]
    pub required_roles: BTreeSet<String>,
    /// Explicitly named verifiers. For `Sequential` the order is the
    /// approval order; for other kinds it is a membership set.
    #[serde(default)]
    pub required_participants: Vec<ParticipantId>,
    /// Number of distinct approvals needed (Multi/Majority).
    pub minimum_approvals: Option<u32>,
    /// Seconds from creation after which a still-pending action expires.
    pub time_constraint_secs: Option<u64>,
}

impl VerificationRequirement {
    /// One approval from anyone authenticated.
    pub fn single() -> Self {
        Self {
            kind: RequirementKind::Single,
            required_roles: BTreeSet::new(),
            required_participants: Vec::new(),
            minimum_approvals: None,
            time_constraint_secs: None,
        }
    }

    /// `minimum` distinct approvals from qualified verifiers.
    pub fn multi(minimum: u32) -> Result<Self, RequirementError> {
        if minimum == 0 {
            return Err(RequirementError::ZeroQuorum);
        }
        Ok(Self {
            kind: RequirementKind::Multi,
            required_roles: BTreeSet::new(),
            required_participants: Vec::new(),
            minimum_approvals: Some(minimum),
            time_constraint_secs: None,
        })
    }

    /// The named participants must approve in the given order.
    pub fn sequential(
        participants: Vec<ParticipantId>,
    ) -> Result<Self, RequirementError> {
        if participants.is_empty() {
            return Err(RequirementError::EmptySequence);
        }
        Ok(Self {
            kind: RequirementKind::Sequential,
            required_roles: BTreeSet::new(),
            required_participants: participants,
            minimum_approvals: None,
            time_constraint_secs: None,
        })
    }

    /// A quorum of the named participants, any order. When `minimum` is not
    /// given it is derived as a strict majority of the participant count.
    pub fn majority(
        participants: Vec<ParticipantId>,
        minimum: Option<u32>,
    ) -> Result<Self, RequirementError> {
        let derived = match minimum {
            Some(0) => return Err(RequirementError::ZeroQuorum),
            Some(m) => m,
            None if participants.is_empty() => {
                return Err(RequirementError::UnderivableQuorum)
            }
            None => participants.len() as u32 / 2 + 1,
        };
        Ok(Self {
            kind: RequirementKind::Majority,
            required_roles: BTreeSet::new(),
            required_participants: participants,
            minimum_approvals: Some(derived),
            time_constraint_secs: None,
        })
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_participants(mut self, participants: Vec<ParticipantId>) -> Self {
        self.required_participants = participants;
        self
    }

    pub fn with_time_constraint(mut self, secs: u64) -> Self {
        self.time_constraint_secs = Some(secs);
        self
    }

    /// Quorum for this requirement: 1 for `Single`, the configured minimum
    /// otherwise. `Sequential` needs every named participant.
    pub fn quorum(&self) -> u32 {
        match self.kind {
            RequirementKind::Single => 1,
            RequirementKind::Sequential => self.required_participants.len() as u32,
            RequirementKind::Multi | RequirementKind::Majority => {
                self.minimum_approvals.unwrap_or(1)
            }
        }
    }

    /// Load-time validation for requirements built from deserialized policy
    /// tables (the constructors already enforce these for in-code tables).
    pub fn validate(&self) -> Result<(), RequirementError> {
        match self.kind {
            RequirementKind::Sequential if self.required_participants.is_empty() => {
                Err(RequirementError::EmptySequence)
            }
            RequirementKind::Majority | RequirementKind::Multi => {
                match self.minimum_approvals {
                    Some(0) => Err(RequirementError::ZeroQuorum),
                    Some(_) => Ok(()),
                    None => Err(RequirementError::UnderivableQuorum),
                }
            }
            _ => Ok(()),
        }
    }
}
