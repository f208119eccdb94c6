//! Participants: the actors that initiate and verify actions.

use crate::id::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A human or automated actor known to the external directory service.
///
/// Created on first reference. Immutable except for the role set, which is
/// mutated by the directory service; never by this engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    /// Role labels as resolved by the directory at the time of lookup.
    pub roles: BTreeSet<String>,
    /// Whether this actor is an automated agent rather than a human.
    pub is_automated: bool,
    /// Public-key material. Opaque bytes, carried for external signature
    /// verification only, never interpreted here.
    #[serde(default)]
    pub public_key: Vec<u8>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            roles: BTreeSet::new(),
            is_automated: false,
            public_key: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}
