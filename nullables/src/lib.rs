//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the engine (clock, ledger, participant
//! directory) sit behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network or an actual ledger
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod directory;
pub mod ledger;

pub use clock::NullClock;
pub use directory::NullDirectory;
pub use ledger::NullLedger;
