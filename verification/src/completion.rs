//! Completion evaluation: is the requirement satisfied yet?

use acta_types::{
    RequirementKind, VerificationRecord, VerificationRequirement,
};

/// Whether the accumulated records satisfy the requirement.
///
/// - `Single`: one approval suffices.
/// - `Multi`/`Majority`: count of distinct approving records reaches the
///   minimum (authorization already guarantees distinctness).
/// - `Sequential`: every declared participant has approved, in order.
pub fn is_satisfied(
    requirement: &VerificationRequirement,
    records: &[VerificationRecord],
) -> bool {
    let approvals = records.iter().filter(|r| r.approved).count() as u32;
    match requirement.kind {
        RequirementKind::Single => approvals >= 1,
        RequirementKind::Multi | RequirementKind::Majority => {
            approvals >= requirement.quorum()
        }
        RequirementKind::Sequential => {
            let expected = &requirement.required_participants;
            records.len() == expected.len()
                && records
                    .iter()
                    .zip(expected)
                    .all(|(record, participant)| {
                        record.approved && record.verifier == *participant
                    })
        }
    }
}
