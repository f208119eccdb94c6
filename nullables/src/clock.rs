//! Nullable clock: deterministic time for testing.

use acta_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A clock that stands still until a test moves it.
///
/// Backed by an atomic so a single instance can be shared across the engine
/// and its background tasks.
pub struct NullClock {
    secs: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(initial_secs),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.secs.load(Ordering::SeqCst))
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute time, forwards or backwards.
    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}
