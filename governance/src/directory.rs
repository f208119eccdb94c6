//! Participant directory: external collaborator resolving identity and roles.
//!
//! The directory is owned by an external service; this engine only consumes
//! it. Role membership changes independently of policy, which is why
//! enterprise `can_act` checks resolve roles on every call instead of
//! caching them.

use acta_types::{Participant, ParticipantId};
use std::collections::BTreeSet;

/// Read-only view of the external participant directory.
pub trait ParticipantDirectory: Send + Sync {
    /// Whether the participant is known to the directory.
    fn exists(&self, id: &ParticipantId) -> bool;

    /// The participant's current role labels. Empty set for unknown ids.
    fn resolve_roles(&self, id: &ParticipantId) -> BTreeSet<String>;

    /// Full participant record, when the directory can supply one. Used for
    /// display names in notifications; policy decisions never depend on it.
    fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        let _ = id;
        None
    }
}
