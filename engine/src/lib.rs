//! The acta engine: action verification and governance as one service.
//!
//! Actors propose named actions; governance policy decides what
//! verification each action needs; verifiers approve or reject under a
//! multi-party state machine; approved actions in audited domains are
//! recorded on an external immutable ledger before they complete.
//!
//! This crate is the wiring layer: it owns the background tasks (ledger
//! worker, expiry and reconcile sweeps), the per-action locks, config and
//! logging. The domain logic lives in the `acta-registry`,
//! `acta-verification`, and `acta-audit` crates.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod logging;
pub mod notify;
pub mod shutdown;
pub mod worker;

pub use clock::{Clock, SystemClock};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use logging::{init_logging, LogFormat};
pub use notify::{NoopNotifier, NoopReward, Notifier, RewardHook};
pub use shutdown::{ShutdownController, ShutdownSignal};
