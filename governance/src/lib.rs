//! Governance policy for the acta engine.
//!
//! Each actor category (individual, professional, enterprise, student,
//! research, government) carries a [`GovernanceModel`]: four lookup tables
//! mapping action descriptors to verification requirements, approval chains,
//! per-action limits, and audit policy. Models are built once at load time,
//! validated (every category must define a default requirement), and never
//! mutated per-request.
//!
//! The [`PolicyResolver`] is the read-only front door: exact descriptor
//! match first, category default otherwise.

pub mod directory;
pub mod error;
pub mod policy;
pub mod resolver;

pub use directory::ParticipantDirectory;
pub use error::GovernanceError;
pub use policy::{
    ActionLimits, ApprovalChain, ApprovalStep, AuditLevel, AuditPolicy, GovernanceModel,
};
pub use resolver::{PolicyDescription, PolicyResolver, ResolvedPolicy, UsageCounters};
