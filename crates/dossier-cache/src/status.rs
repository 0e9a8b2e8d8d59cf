//! Last computed completion status per holder or property

use crate::policy::{CachePolicy, CacheStats};
use dossier_model::{CompletionStatus, StatusSubject};
use moka::sync::Cache;

/// Read-side cache for dashboards and banners
#[derive(Debug, Clone)]
pub struct StatusCache {
    inner: Cache<StatusSubject, CompletionStatus>,
}

impl StatusCache {
    /// Create cache with the given policy
    #[inline]
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: policy.build(),
        }
    }

    /// Record a freshly computed status
    #[inline]
    pub fn record(&self, subject: StatusSubject, status: CompletionStatus) {
        self.inner.insert(subject, status);
    }

    /// Last recorded status, if still cached
    #[inline]
    #[must_use]
    pub fn get(&self, subject: &StatusSubject) -> Option<CompletionStatus> {
        self.inner.get(subject)
    }

    /// Forget one subject
    #[inline]
    pub fn invalidate(&self, subject: &StatusSubject) {
        self.inner.invalidate(subject);
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
