use acta_types::{ActorCategory, RequirementError};
use thiserror::Error;

/// Configuration-level governance errors. These are fatal at policy-load
/// time; a loaded resolver can no longer produce them.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("category {category} defines no default verification requirement")]
    MissingDefault { category: ActorCategory },

    #[error("invalid requirement for {category}/{descriptor}: {source}")]
    InvalidRequirement {
        category: ActorCategory,
        descriptor: String,
        source: RequirementError,
    },

    #[error("invalid default requirement for {category}: {source}")]
    InvalidDefault {
        category: ActorCategory,
        source: RequirementError,
    },
}
