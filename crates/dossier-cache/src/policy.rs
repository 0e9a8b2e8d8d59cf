//! Eviction policy shared by every cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capacity bound plus time-to-live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Maximum number of entries before LRU-style eviction
    pub capacity: u64,
    /// Seconds an entry lives after insertion
    pub ttl_secs: u64,
}

impl CachePolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub const fn new(capacity: u64, ttl_secs: u64) -> Self {
        Self { capacity, ttl_secs }
    }

    /// Time-to-live as a duration
    #[inline]
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub(crate) fn build<K, V>(&self) -> moka::sync::Cache<K, V>
    where
        K: std::hash::Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        moka::sync::Cache::builder()
            .max_capacity(self.capacity)
            .time_to_live(self.ttl())
            .build()
    }
}

impl Default for CachePolicy {
    /// 10,000 entries, five minutes
    fn default() -> Self {
        Self::new(10_000, 300)
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of live entries
    pub entry_count: u64,
}
