//! Audit trail recording.
//!
//! A finalized action is reduced to a canonical digest; a fixed, ordered
//! serialization of its core fields; and written to an external immutable
//! ledger keyed by action id. Recording is idempotent per action id, and
//! digest computation is part of the contract: an independent implementation
//! following the same field order produces byte-identical digests.

pub mod digest;
pub mod error;
pub mod recorder;

pub use digest::canonical_digest;
pub use error::LedgerError;
pub use recorder::{AuditRecorder, LedgerClient};
