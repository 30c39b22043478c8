//! Named resource locks.
//!
//! A registry of keyed async mutexes used to serialize logically related
//! operations (one lock per lead, one per staff slot) without holding row
//! locks for the duration. This is the single-instance stand-in for a
//! database advisory lock; cross-process exclusivity is handled elsewhere by
//! conditional updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for one named lock. The lock is released on drop.
pub type NamedLockGuard = OwnedMutexGuard<()>;

/// Registry of named locks. Entries are created on first use and never
/// evicted.
#[derive(Default)]
pub struct NamedLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting until it is free.
    pub async fn acquire(&self, key: &str) -> NamedLockGuard {
        let cell = {
            let mut map = self.entries.lock().expect("lock registry poisoned");
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        cell.lock_owned().await
    }

    /// Acquire two locks sequentially, `first` before `second`.
    ///
    /// Callers must pass keys in the application's fixed order (lead before
    /// slot) so two requests can never wait on each other's second key.
    pub async fn acquire_pair(
        &self,
        first: &str,
        second: &str,
    ) -> (NamedLockGuard, NamedLockGuard) {
        let a = self.acquire(first).await;
        let b = self.acquire(second).await;
        (a, b)
    }
}
