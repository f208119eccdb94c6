use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(String),

    #[error("record {0} already exists")]
    AlreadyExists(String),

    #[error("version conflict on {id}: expected {expected}, stored {stored}")]
    VersionConflict {
        id: String,
        expected: u64,
        stored: u64,
    },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("backend error: {0}")]
    Backend(String),
}
