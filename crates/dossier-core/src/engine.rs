//! Engine facade
//!
//! Wires the resolver, upsert engine, aggregator and caches over one store.
//! Every submission entry point goes through [`DossierEngine`].

use crate::aggregate::{CompletionAggregator, StatusUpdate};
use crate::catalog::RequirementCatalog;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, ItemError};
use crate::upsert::{UpsertEngine, UpsertOutcome};
use dossier_cache::{CacheStats, ContextCache, StatusCache, SubmissionLedger};
use dossier_model::{
    ArtifactMetadata, CaseContext, CaseHolderId, CompletionStatus, ContentLocator, DocumentKind,
    HolderGraph, LeaseId, PropertyId, PropertyLink, StatusSubject, TargetRef,
};
use dossier_resolver::{AttachmentResolver, ResolutionError};
use dossier_store::{DossierStore, StoreError};
use std::sync::Arc;

/// Entry counts of the injected caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCacheStats {
    pub context: CacheStats,
    pub status: CacheStats,
    pub ledger: CacheStats,
}

/// Classification, attachment and completion over a [`DossierStore`]
#[derive(Debug)]
pub struct DossierEngine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) resolver: AttachmentResolver,
    pub(crate) upserts: UpsertEngine<S>,
    pub(crate) aggregator: CompletionAggregator<S>,
    pub(crate) contexts: ContextCache,
    pub(crate) statuses: StatusCache,
    pub(crate) ledger: SubmissionLedger,
    config: EngineConfig,
}

impl<S: DossierStore> DossierEngine<S> {
    /// Create engine with default configuration
    #[must_use]
    pub fn new(store: Arc<S>, catalog: RequirementCatalog) -> Self {
        Self::build(store, catalog, EngineConfig::default())
    }

    /// Create engine with explicit configuration
    ///
    /// # Errors
    /// [`EngineError::Config`] or [`EngineError::Catalog`] when either fails validation.
    pub fn with_config(
        store: Arc<S>,
        catalog: RequirementCatalog,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self::build(store, catalog, config))
    }

    fn build(store: Arc<S>, catalog: RequirementCatalog, config: EngineConfig) -> Self {
        tracing::debug!(
            checklists = catalog.holders.len(),
            conflict_retries = config.conflict_retries,
            "attachment engine created"
        );
        Self {
            upserts: UpsertEngine::new(Arc::clone(&store), config.conflict_retries),
            aggregator: CompletionAggregator::new(Arc::clone(&store), Arc::new(catalog)),
            resolver: AttachmentResolver::new(),
            contexts: ContextCache::new(config.cache.context),
            statuses: StatusCache::new(config.cache.status),
            ledger: SubmissionLedger::new(config.cache.ledger),
            store,
            config,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Requirement catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &RequirementCatalog {
        self.aggregator.catalog()
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the resolver context for a holder, optionally scoped to a property and lease
    ///
    /// The holder graph comes from the context cache only while the store's
    /// graph version is unchanged, so individuals added since the last load
    /// are always visible. A property or lease id that does not resolve is
    /// left out of the context; items that need it then fail individually.
    ///
    /// # Errors
    /// [`EngineError::HolderNotFound`] for an unknown holder; store failures.
    pub fn load_context(
        &self,
        holder_id: CaseHolderId,
        property_id: Option<PropertyId>,
        lease_id: Option<LeaseId>,
    ) -> EngineResult<CaseContext> {
        let version = self.store.graph_version(holder_id)?;
        let graph = self
            .contexts
            .get_or_try_load(holder_id, version, || self.load_graph(holder_id))?
            .ok_or(EngineError::HolderNotFound(holder_id))?;

        let property = match property_id {
            Some(id) => match self.store.property(id)? {
                Some(property) => Some(PropertyLink {
                    id,
                    owner_id: property.owner_id,
                }),
                None => {
                    tracing::warn!(
                        holder = %holder_id,
                        property = %id,
                        "property not found; dropped from context"
                    );
                    None
                }
            },
            None => None,
        };

        let lease = match lease_id {
            Some(id) if self.store.lease(id)?.is_some() => Some(id),
            Some(id) => {
                tracing::warn!(
                    holder = %holder_id,
                    lease = %id,
                    "lease not found; dropped from context"
                );
                None
            }
            None => None,
        };

        Ok(CaseContext::new(graph).with_property(property).with_lease(lease))
    }

    fn load_graph(&self, holder_id: CaseHolderId) -> Result<Option<HolderGraph>, StoreError> {
        let Some(holder) = self.store.holder(holder_id)? else {
            return Ok(None);
        };
        let individuals = self.store.individuals_of(holder_id)?;
        let organization = self.store.organization_of(holder_id)?;
        Ok(Some(HolderGraph::new(holder, individuals, organization)))
    }

    /// Resolve the owner of an artifact of `kind`
    ///
    /// # Errors
    /// A [`ResolutionError`] naming the missing context.
    #[inline]
    pub fn resolve(
        &self,
        kind: DocumentKind,
        context: &CaseContext,
        party_index: Option<usize>,
    ) -> Result<TargetRef, ResolutionError> {
        self.resolver.resolve(kind, context, party_index)
    }

    /// Resolve and upsert one artifact without recomputing completion
    ///
    /// # Errors
    /// [`ItemError`] when the kind cannot be placed or the write fails.
    pub fn attach(
        &self,
        context: &CaseContext,
        locator: ContentLocator,
        kind: DocumentKind,
        party_index: Option<usize>,
        metadata: ArtifactMetadata,
    ) -> Result<UpsertOutcome, ItemError> {
        let target = self.resolve(kind, context, party_index)?;
        Ok(self.upsert(locator, kind, target, metadata)?)
    }

    /// Create or update the document identified by (locator, kind, target)
    ///
    /// # Errors
    /// See [`UpsertEngine::upsert`].
    #[inline]
    pub fn upsert(
        &self,
        locator: ContentLocator,
        kind: DocumentKind,
        target: TargetRef,
        metadata: ArtifactMetadata,
    ) -> Result<UpsertOutcome, crate::error::UpsertError> {
        let outcome = self.upserts.upsert(locator, kind, target, metadata);
        self.prune_locks();
        outcome
    }

    /// Recompute a holder's completion and refresh the caches
    ///
    /// # Errors
    /// [`EngineError::HolderNotFound`] for an unknown id; store failures.
    pub fn recompute_holder(&self, id: CaseHolderId) -> EngineResult<StatusUpdate> {
        let update = self.refresh_holder(id);
        self.prune_locks();
        update
    }

    /// Recompute a property's completion and refresh the caches
    ///
    /// # Errors
    /// [`EngineError::PropertyNotFound`] for an unknown id; store failures.
    pub fn recompute_property(&self, id: PropertyId) -> EngineResult<StatusUpdate> {
        let update = self.refresh_property(id);
        self.prune_locks();
        update
    }

    // Cache writes happen under the subject lock so they follow store order.
    pub(crate) fn refresh_holder(&self, id: CaseHolderId) -> EngineResult<StatusUpdate> {
        self.aggregator.recompute_holder_with(id, |update| {
            self.statuses.record(update.subject, update.current);
            self.contexts.refresh_status(&id, update.current);
        })
    }

    pub(crate) fn refresh_property(&self, id: PropertyId) -> EngineResult<StatusUpdate> {
        self.aggregator.recompute_property_with(id, |update| {
            self.statuses.record(update.subject, update.current);
        })
    }

    pub(crate) fn prune_locks(&self) {
        let pruned = self.upserts.prune_locks() + self.aggregator.prune_locks();
        if pruned > 0 {
            tracing::trace!(pruned, "idle locks pruned");
        }
    }

    /// Last computed status without recomputation
    #[inline]
    #[must_use]
    pub fn cached_status(&self, subject: &StatusSubject) -> Option<CompletionStatus> {
        self.statuses.get(subject)
    }

    /// Forget a holder's cached graph and status
    pub fn invalidate_holder(&self, id: &CaseHolderId) {
        self.contexts.invalidate(id);
        self.statuses.invalidate(&StatusSubject::CaseHolder(*id));
    }

    /// Cache entry counts
    #[must_use]
    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            context: self.contexts.stats(),
            status: self.statuses.stats(),
            ledger: self.ledger.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HolderChecklist;
    use dossier_model::{CaseHolder, HolderRole, IdentityKind, Individual, Lease, Property};
    use dossier_store::MemoryStore;

    fn tenant() -> (Arc<MemoryStore>, CaseHolderId) {
        let store = Arc::new(MemoryStore::new());
        let holder =
            store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant));
        (store, holder)
    }

    #[test]
    fn unknown_holder_is_fatal() {
        let (store, _) = tenant();
        let engine = DossierEngine::new(store, RequirementCatalog::new());
        let err = engine.load_context(CaseHolderId::new(), None, None).unwrap_err();
        assert!(matches!(err, EngineError::HolderNotFound(_)));
    }

    #[test]
    fn unknown_property_and_lease_are_dropped() {
        let (store, holder) = tenant();
        let engine = DossierEngine::new(store, RequirementCatalog::new());
        let context = engine
            .load_context(holder, Some(PropertyId::new()), Some(LeaseId::new()))
            .unwrap();
        assert!(context.property.is_none());
        assert!(context.lease.is_none());
    }

    #[test]
    fn known_property_and_lease_are_linked() {
        let (store, holder) = tenant();
        let owner =
            store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Owner));
        let property = store.insert_property(Property::new(owner)).unwrap();
        let lease = store.insert_lease(Lease::new(property)).unwrap();
        let engine = DossierEngine::new(store, RequirementCatalog::new());

        let context = engine.load_context(holder, Some(property), Some(lease)).unwrap();
        assert_eq!(context.property, Some(PropertyLink { id: property, owner_id: owner }));
        assert_eq!(context.lease, Some(lease));
    }

    #[test]
    fn graph_is_reused_until_it_changes() {
        let (store, holder) = tenant();
        let engine = DossierEngine::new(Arc::clone(&store), RequirementCatalog::new());

        let first = engine.load_context(holder, None, None).unwrap();
        let again = engine.load_context(holder, None, None).unwrap();
        assert!(std::ptr::eq(first.graph(), again.graph()));
        assert!(first.individuals().is_empty());

        store.insert_individual(Individual::new(holder, true)).unwrap();
        let reloaded = engine.load_context(holder, None, None).unwrap();
        assert_eq!(reloaded.individuals().len(), 1);
        assert_eq!(engine.cache_stats().context.entry_count, 1);
    }

    #[test]
    fn added_individual_is_targetable_without_invalidation() {
        let (store, holder) = tenant();
        let primary = store.insert_individual(Individual::new(holder, true)).unwrap();
        let engine = DossierEngine::new(Arc::clone(&store), RequirementCatalog::new());
        let context = engine.load_context(holder, None, None).unwrap();
        assert_eq!(
            engine.resolve(DocumentKind::IdentityDocument, &context, Some(1)),
            Ok(TargetRef::Individual(primary))
        );

        let second = store.insert_individual(Individual::new(holder, false)).unwrap();
        let context = engine.load_context(holder, None, None).unwrap();
        assert_eq!(
            engine.resolve(DocumentKind::IdentityDocument, &context, Some(1)),
            Ok(TargetRef::Individual(second))
        );
    }

    #[test]
    fn direct_entry_points_leave_no_idle_locks() {
        let (store, holder) = tenant();
        let engine = DossierEngine::new(Arc::clone(&store), RequirementCatalog::new());

        engine
            .upsert(
                ContentLocator::new("blob://tax").unwrap(),
                DocumentKind::TaxNotice,
                TargetRef::CaseHolder(holder),
                ArtifactMetadata::new("tax", "application/pdf", 3),
            )
            .unwrap();
        engine.recompute_holder(holder).unwrap();

        assert_eq!(engine.upserts.prune_locks(), 0);
        assert_eq!(engine.aggregator.prune_locks(), 0);
    }

    #[test]
    fn recompute_records_status_in_caches() {
        let (store, holder) = tenant();
        let catalog = RequirementCatalog::new().with_holder(
            HolderChecklist::new(HolderRole::Tenant, IdentityKind::Individual)
                .with_document(DocumentKind::TaxNotice)
                .with_document(DocumentKind::FamilyBooklet),
        );
        let engine = DossierEngine::new(Arc::clone(&store), catalog);
        let context = engine.load_context(holder, None, None).unwrap();

        engine
            .attach(
                &context,
                ContentLocator::new("blob://tax").unwrap(),
                DocumentKind::TaxNotice,
                None,
                ArtifactMetadata::new("tax", "application/pdf", 3),
            )
            .unwrap();
        let update = engine.recompute_holder(holder).unwrap();

        assert_eq!(update.current, CompletionStatus::Partial);
        assert_eq!(
            engine.cached_status(&StatusSubject::CaseHolder(holder)),
            Some(CompletionStatus::Partial)
        );
        let reloaded = engine.load_context(holder, None, None).unwrap();
        assert_eq!(reloaded.holder().status, CompletionStatus::Partial);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (store, _) = tenant();
        let config = EngineConfig::new().with_conflict_retries(42);
        assert!(matches!(
            DossierEngine::with_config(store, RequirementCatalog::new(), config),
            Err(EngineError::Config(_))
        ));
    }
}
