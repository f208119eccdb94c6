use acta_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("action {0} not found")]
    NotFound(String),

    #[error("initiator {0} is not known to the participant directory")]
    UnknownInitiator(String),

    #[error("initiator {actor} may not initiate {descriptor} under category {category}")]
    NotPermitted {
        actor: String,
        category: String,
        descriptor: String,
    },

    #[error("invalid parameters: {}", violations.join("; "))]
    InvalidParameters { violations: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}
