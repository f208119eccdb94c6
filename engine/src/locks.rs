//! Per-action serialization of state transitions.
//!
//! Every mutation of an action record (submit, expiry, ledger completion)
//! runs under that action's lock, so concurrent submissions for the same
//! action are applied one at a time and the compare-and-swap in the store
//! acts as a backstop, not the primary mechanism.

use acta_types::ActionId;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// Prune the lock map once it grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Default)]
pub struct ActionLocks {
    locks: Mutex<HashMap<ActionId, std::sync::Arc<AsyncMutex<()>>>>,
}

impl ActionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one action, waiting if another task holds it.
    pub async fn acquire(&self, id: ActionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            if locks.len() > PRUNE_THRESHOLD {
                // Entries nobody holds can be dropped; a later acquire
                // recreates them.
                locks.retain(|_, l| std::sync::Arc::strong_count(l) > 1);
            }
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
