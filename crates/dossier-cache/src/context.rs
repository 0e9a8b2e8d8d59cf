//! Holder-graph cache
//!
//! Keeps the loaded case holder, its ordered individuals and organization so
//! repeated submissions against the same file skip the graph reads. Each entry
//! remembers the store's graph version it was loaded at; a lookup with a newer
//! version reloads.

use crate::policy::{CachePolicy, CacheStats};
use dossier_model::{CaseHolderId, CompletionStatus, HolderGraph};
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedGraph {
    version: u64,
    graph: Arc<HolderGraph>,
}

/// Holder id to loaded holder graph
#[derive(Debug, Clone)]
pub struct ContextCache {
    inner: Cache<CaseHolderId, CachedGraph>,
}

impl ContextCache {
    /// Create cache with the given policy
    #[inline]
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: policy.build(),
        }
    }

    /// Cached graph loaded at `version`, if present and not expired
    #[must_use]
    pub fn get(&self, id: &CaseHolderId, version: u64) -> Option<Arc<HolderGraph>> {
        self.inner
            .get(id)
            .filter(|cached| cached.version == version)
            .map(|cached| cached.graph)
    }

    /// Insert a graph loaded at `version`
    pub fn insert(&self, version: u64, graph: HolderGraph) -> Arc<HolderGraph> {
        let graph = Arc::new(graph);
        let cached = CachedGraph {
            version,
            graph: Arc::clone(&graph),
        };
        self.inner.insert(graph.holder.id, cached);
        graph
    }

    /// Cached graph for `version`, or load and cache it
    ///
    /// Read `version` from the store before loading: an edit racing the load
    /// then leaves an entry that the next lookup already treats as stale.
    /// `load` returning `Ok(None)` caches nothing.
    ///
    /// # Errors
    /// Whatever `load` returns.
    pub fn get_or_try_load<E>(
        &self,
        id: CaseHolderId,
        version: u64,
        load: impl FnOnce() -> Result<Option<HolderGraph>, E>,
    ) -> Result<Option<Arc<HolderGraph>>, E> {
        if let Some(cached) = self.get(&id, version) {
            tracing::trace!(holder = %id, version, "context cache hit");
            return Ok(Some(cached));
        }
        tracing::trace!(holder = %id, version, "context cache miss");
        Ok(load()?.map(|graph| self.insert(version, graph)))
    }

    /// Rewrite the cached holder status after a recompute
    ///
    /// Absent entries stay absent.
    pub fn refresh_status(&self, id: &CaseHolderId, status: CompletionStatus) {
        let result = self.inner.entry(*id).and_compute_with(|entry| {
            let Some(entry) = entry else {
                return Op::Nop;
            };
            let cached = entry.into_value();
            if cached.graph.holder.status == status {
                return Op::Nop;
            }
            let mut graph = (*cached.graph).clone();
            graph.holder.status = status;
            Op::Put(CachedGraph {
                version: cached.version,
                graph: Arc::new(graph),
            })
        });
        if matches!(result, CompResult::ReplacedWith(_)) {
            tracing::trace!(holder = %id, %status, "cached holder status refreshed");
        }
    }

    /// Drop one holder after an external graph edit
    #[inline]
    pub fn invalidate(&self, id: &CaseHolderId) {
        self.inner.invalidate(id);
    }

    /// Drop everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
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

impl Default for ContextCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
