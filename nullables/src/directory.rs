//! Nullable participant directory: programmable identities and roles.

use acta_governance::ParticipantDirectory;
use acta_types::{Participant, ParticipantId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// A test directory holding a fixed set of participants and their roles.
///
/// Entries can be added or re-rolled at any point, so tests can exercise
/// role changes between policy checks.
#[derive(Default)]
pub struct NullDirectory {
    entries: Mutex<HashMap<ParticipantId, Participant>>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `(participant, roles)` pairs. The id doubles as the
    /// display name.
    pub fn with(entries: &[(&str, &[&str])]) -> Self {
        let directory = Self::new();
        for (id, roles) in entries {
            directory.register(Participant::new(*id, *id).with_roles(roles.iter().copied()));
        }
        directory
    }

    /// Add or replace a participant.
    pub fn register(&self, participant: Participant) {
        self.entries
            .lock()
            .unwrap()
            .insert(participant.id.clone(), participant);
    }

    /// Forget a participant entirely.
    pub fn remove(&self, id: &ParticipantId) {
        self.entries.lock().unwrap().remove(id);
    }
}

impl ParticipantDirectory for NullDirectory {
    fn exists(&self, id: &ParticipantId) -> bool {
        self.entries.lock().unwrap().contains_key(id)
    }

    fn resolve_roles(&self, id: &ParticipantId) -> BTreeSet<String> {
        self.entries
            .lock()
            .unwrap()
            .get(id)
            .map(|p| p.roles.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        self.entries.lock().unwrap().get(id).cloned()
    }
}
