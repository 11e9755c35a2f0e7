//! Per-key async mutual exclusion.

use std::sync::Arc;

use atelier_core::types::DbId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A lazily grown map of one async mutex per id.
///
/// Holding the guard returned by [`lock`](KeyedLocks::lock) serializes every
/// other caller asking for the same id while leaving other ids untouched.
/// Entries are never evicted; the map grows with the number of distinct ids
/// seen.
#[derive(Default)]
pub struct KeyedLocks {
    inner: DashMap<DbId, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: DbId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let mutex = self
            .inner
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
