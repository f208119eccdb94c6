//! Fundamental types for the acta engine.
//!
//! This crate defines the core data model shared across every other crate in
//! the workspace: ids, timestamps, participants, action descriptors,
//! verification requirements, and the action request/record types.

pub mod action;
pub mod category;
pub mod descriptor;
pub mod digest;
pub mod id;
pub mod param;
pub mod participant;
pub mod requirement;
pub mod time;

pub use action::{
    ActionMetadata, ActionRecord, ActionRequest, ActionStatus, ArtifactRef, AuditState,
    LedgerReceipt, Priority, VerificationRecord,
};
pub use category::ActorCategory;
pub use descriptor::ActionDescriptor;
pub use digest::ContentDigest;
pub use id::{ActionId, ParticipantId};
pub use param::ParamValue;
pub use participant::Participant;
pub use requirement::{RequirementError, RequirementKind, VerificationRequirement};
pub use time::Timestamp;
