//! The action registry: durable home of action requests.
//!
//! `create` is the only way an action comes into existence: it generates the
//! id, merges metadata defaults, resolves the governance policy, enforces
//! parameter limits and quotas, and persists a pending record. `query`
//! returns a lazy, restartable sequence over matching records in
//! `(created_at, id)` ascending order.

pub mod error;
pub mod query;
pub mod registry;

pub use error::RegistryError;
pub use query::{ActionFilter, Query};
pub use registry::{ActionRegistry, MetadataOverrides};
