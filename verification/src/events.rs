//! Typed lifecycle events emitted by the state machine.

use acta_types::{ActionId, ParticipantId};

/// Events for the engine to dispatch after a transition is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionEvent {
    /// The verification requirement was satisfied.
    Approved { id: ActionId },
    /// A verifier explicitly rejected the action. Final.
    Rejected {
        id: ActionId,
        verifier: ParticipantId,
    },
    /// The time constraint elapsed while the action was still pending.
    Expired { id: ActionId },
    /// The action is approved and eligible for ledger recording; the ledger
    /// worker should pick it up.
    LedgerPending { id: ActionId },
    /// The action reached its terminal completed state (ledger recording
    /// done, or not required).
    Completed { id: ActionId },
}
