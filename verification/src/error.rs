use acta_types::{ActionStatus, ParticipantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("action is already finalized (status: {status})")]
    AlreadyFinalized { status: ActionStatus },

    #[error("verifier {verifier} is not authorized: {required}")]
    UnauthorizedVerifier {
        verifier: ParticipantId,
        /// Which role or participant set would have qualified.
        required: String,
    },

    #[error("out-of-sequence submission: expected {expected}, got {got}")]
    OutOfSequence {
        expected: ParticipantId,
        got: ParticipantId,
    },

    #[error("verifier {0} has already submitted a verification for this action")]
    DuplicateVerification(ParticipantId),
}
