//! The verification state machine.
//!
//! `submit` is the single mutation path: it authorizes the verifier against
//! the action's requirement, appends a verification record (approvals and
//! rejections alike; both matter for audit), and evaluates completion.
//! Side effects are never performed here; the machine emits typed
//! [`ActionEvent`]s and the engine crate dispatches them (ledger write,
//! notification, token mint), so core correctness never depends on external
//! service availability.

pub mod authorize;
pub mod completion;
pub mod error;
pub mod events;
pub mod machine;

pub use authorize::authorize;
pub use completion::is_satisfied;
pub use error::VerificationError;
pub use events::ActionEvent;
pub use machine::{apply_expiry, submit};
