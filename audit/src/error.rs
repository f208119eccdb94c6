use thiserror::Error;

/// Errors from the external ledger, split by retryability.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger is unavailable or timed out. Retry with backoff.
    #[error("transient ledger error: {0}")]
    Transient(String),

    /// The ledger rejected the write (malformed digest, key conflict with a
    /// different digest). Retrying cannot help; needs operator attention.
    #[error("permanent ledger error: {0}")]
    Permanent(String),
}
