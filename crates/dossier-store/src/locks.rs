//! Keyed mutexes serializing match-then-write sequences
//!
//! Items sharing a key run one at a time; items with different keys never
//! contend. Handles are reference-counted so idle entries can be pruned.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// Registry of per-key locks
#[derive(Debug)]
pub struct LockRegistry<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> LockRegistry<K> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Shared handle for `key`, created on first use
    #[must_use]
    pub fn handle(&self, key: &K) -> Arc<Mutex<()>> {
        self.locks.entry(key.clone()).or_default().value().clone()
    }

    /// Run `f` while holding the lock for `key`
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let handle = self.handle(key);
        let _guard = handle.lock();
        f()
    }

    /// Drop entries nobody currently holds; returns how many were removed
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of tracked keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for LockRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
