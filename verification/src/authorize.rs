//! Verifier authorization against a requirement.

use crate::error::VerificationError;
use acta_types::{
    ParticipantId, RequirementKind, VerificationRecord, VerificationRequirement,
};
use std::collections::BTreeSet;

/// Check whether `verifier` may submit a verification right now, given the
/// records already appended.
///
/// - `Single`/`Multi`: the verifier must hold one of the required roles or
///   be explicitly listed, whichever constraint the requirement sets. When
///   neither is set, any authenticated participant qualifies. `Multi`
///   additionally rejects duplicate submissions.
/// - `Sequential`: the verifier must be the next unconsumed entry of the
///   declared order. Out-of-order submission is an immediate failure, not a
///   queue.
/// - `Majority`: membership check (when participants are named) plus the
///   one-submission-per-verifier rule.
pub fn authorize(
    requirement: &VerificationRequirement,
    records: &[VerificationRecord],
    verifier: &ParticipantId,
    verifier_roles: &BTreeSet<String>,
) -> Result<(), VerificationError> {
    match requirement.kind {
        RequirementKind::Single => {
            check_membership(requirement, verifier, verifier_roles)
        }
        RequirementKind::Multi | RequirementKind::Majority => {
            check_membership(requirement, verifier, verifier_roles)?;
            if records.iter().any(|r| r.verifier == *verifier) {
                return Err(VerificationError::DuplicateVerification(verifier.clone()));
            }
            Ok(())
        }
        RequirementKind::Sequential => {
            // Every prior record is an approval (a rejection finalizes the
            // action), so the consumed prefix length is the record count.
            let consumed = records.len();
            match requirement.required_participants.get(consumed) {
                Some(expected) if expected == verifier => Ok(()),
                Some(expected) => Err(VerificationError::OutOfSequence {
                    expected: expected.clone(),
                    got: verifier.clone(),
                }),
                // Sequence fully consumed; completion should already have
                // fired, so treat any extra submission as unauthorized.
                None => Err(VerificationError::UnauthorizedVerifier {
                    verifier: verifier.clone(),
                    required: "sequence already fully consumed".to_string(),
                }),
            }
        }
    }
}

fn check_membership(
    requirement: &VerificationRequirement,
    verifier: &ParticipantId,
    verifier_roles: &BTreeSet<String>,
) -> Result<(), VerificationError> {
    let roles_set = !requirement.required_roles.is_empty();
    let participants_set = !requirement.required_participants.is_empty();

    if !roles_set && !participants_set {
        return Ok(());
    }

    if roles_set
        && requirement
            .required_roles
            .intersection(verifier_roles)
            .next()
            .is_some()
    {
        return Ok(());
    }

    if participants_set && requirement.required_participants.contains(verifier) {
        return Ok(());
    }

    let mut required = Vec::new();
    if roles_set {
        required.push(format!(
            "one of roles [{}]",
            requirement
                .required_roles
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if participants_set {
        required.push(format!(
            "one of participants [{}]",
            requirement
                .required_participants
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Err(VerificationError::UnauthorizedVerifier {
        verifier: verifier.clone(),
        required: required.join(" or "),
    })
}
