//! Completion aggregation
//!
//! Counts how many checklist units a holder or property satisfies and derives
//! its [`CompletionStatus`]. Recomputation is serialized per subject.

use crate::catalog::{Requirement, RequirementCatalog};
use crate::error::{EngineError, EngineResult};
use dossier_model::{
    field_present, order_individuals, CaseHolder, CaseHolderId, CompletionStatus, DocumentKind,
    HolderRole, Property, PropertyId, StatusSubject, TargetRef,
};
use dossier_resolver::{rule_for, RuleClass};
use dossier_store::{DossierStore, LockRegistry, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of one recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub subject: StatusSubject,
    pub previous: CompletionStatus,
    pub current: CompletionStatus,
    pub satisfied: usize,
    pub total: usize,
    /// Unmet requirements in checklist order
    pub missing: Vec<Requirement>,
}

impl StatusUpdate {
    /// Status moved
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Satisfied/total counter with the list of misses
#[derive(Debug, Default)]
struct Tally {
    satisfied: usize,
    total: usize,
    missing: Vec<Requirement>,
}

impl Tally {
    fn check(&mut self, ok: bool, requirement: impl FnOnce() -> Requirement) {
        self.total += 1;
        if ok {
            self.satisfied += 1;
        } else {
            self.missing.push(requirement());
        }
    }

    fn miss(&mut self, requirement: Requirement) {
        self.check(false, || requirement);
    }

    fn into_update(
        self,
        subject: StatusSubject,
        previous: CompletionStatus,
        current: CompletionStatus,
    ) -> StatusUpdate {
        StatusUpdate {
            subject,
            previous,
            current,
            satisfied: self.satisfied,
            total: self.total,
            missing: self.missing,
        }
    }
}

/// Per-owner document kinds, read at most once per recomputation
struct AttachedKinds<'a, S> {
    store: &'a S,
    loaded: HashMap<TargetRef, HashSet<DocumentKind>>,
}

impl<'a, S: DossierStore> AttachedKinds<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
        }
    }

    fn has(&mut self, owner: TargetRef, kind: DocumentKind) -> Result<bool, StoreError> {
        if let Some(kinds) = self.loaded.get(&owner) {
            return Ok(kinds.contains(&kind));
        }
        let kinds: HashSet<DocumentKind> = self
            .store
            .documents_for(&owner)?
            .into_iter()
            .map(|document| document.kind)
            .collect();
        let found = kinds.contains(&kind);
        self.loaded.insert(owner, kinds);
        Ok(found)
    }

    fn any(&mut self, owners: &[TargetRef], kind: DocumentKind) -> Result<bool, StoreError> {
        for owner in owners {
            if self.has(*owner, kind)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Derives holder and property completion from the stored graph
#[derive(Debug)]
pub struct CompletionAggregator<S> {
    store: Arc<S>,
    catalog: Arc<RequirementCatalog>,
    locks: LockRegistry<StatusSubject>,
}

impl<S: DossierStore> CompletionAggregator<S> {
    /// Create aggregator
    #[must_use]
    pub fn new(store: Arc<S>, catalog: Arc<RequirementCatalog>) -> Self {
        Self {
            store,
            catalog,
            locks: LockRegistry::new(),
        }
    }

    /// Requirement catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &RequirementCatalog {
        &self.catalog
    }

    /// Recompute and persist a case holder's status
    ///
    /// # Errors
    /// [`EngineError::HolderNotFound`] for an unknown id; store failures.
    #[inline]
    pub fn recompute_holder(&self, id: CaseHolderId) -> EngineResult<StatusUpdate> {
        self.recompute_holder_with(id, |_| {})
    }

    /// Recompute a holder's status, running `publish` before the subject lock
    /// is released
    ///
    /// Derived copies of the status written from `publish` therefore land in
    /// the same order as the store writes.
    ///
    /// # Errors
    /// See [`Self::recompute_holder`]; `publish` is not called on error.
    #[tracing::instrument(skip(self, publish), fields(holder = %id))]
    pub fn recompute_holder_with(
        &self,
        id: CaseHolderId,
        publish: impl FnOnce(&StatusUpdate),
    ) -> EngineResult<StatusUpdate> {
        let subject = StatusSubject::CaseHolder(id);
        self.locks.with_lock(&subject, || -> EngineResult<StatusUpdate> {
            let holder = self
                .store
                .holder(id)?
                .ok_or(EngineError::HolderNotFound(id))?;
            let tally = self.evaluate_holder(&holder)?;
            let current = CompletionStatus::classify(tally.satisfied, tally.total, holder.status);
            if current != holder.status {
                self.store.set_holder_status(id, current)?;
            }
            let update = self.record(tally.into_update(subject, holder.status, current));
            publish(&update);
            Ok(update)
        })
    }

    /// Recompute and persist a property's status
    ///
    /// # Errors
    /// [`EngineError::PropertyNotFound`] for an unknown id; store failures.
    #[inline]
    pub fn recompute_property(&self, id: PropertyId) -> EngineResult<StatusUpdate> {
        self.recompute_property_with(id, |_| {})
    }

    /// Property counterpart of [`Self::recompute_holder_with`]
    ///
    /// # Errors
    /// See [`Self::recompute_property`].
    #[tracing::instrument(skip(self, publish), fields(property = %id))]
    pub fn recompute_property_with(
        &self,
        id: PropertyId,
        publish: impl FnOnce(&StatusUpdate),
    ) -> EngineResult<StatusUpdate> {
        let subject = StatusSubject::Property(id);
        self.locks.with_lock(&subject, || -> EngineResult<StatusUpdate> {
            let property = self
                .store
                .property(id)?
                .ok_or(EngineError::PropertyNotFound(id))?;
            let tally = self.evaluate_property(&property)?;
            let current = CompletionStatus::classify(tally.satisfied, tally.total, property.status);
            if current != property.status {
                self.store.set_property_status(id, current)?;
            }
            let update = self.record(tally.into_update(subject, property.status, current));
            publish(&update);
            Ok(update)
        })
    }

    /// Drop lock entries for subjects nobody is recomputing
    pub fn prune_locks(&self) -> usize {
        self.locks.prune()
    }

    fn record(&self, update: StatusUpdate) -> StatusUpdate {
        metrics::counter!("dossier_status_recomputations_total").increment(1);
        if update.changed() {
            tracing::info!(
                subject = %update.subject,
                previous = %update.previous,
                current = %update.current,
                satisfied = update.satisfied,
                total = update.total,
                "completion status changed"
            );
        } else {
            tracing::debug!(
                subject = %update.subject,
                status = %update.current,
                satisfied = update.satisfied,
                total = update.total,
                "completion status unchanged"
            );
        }
        update
    }

    fn evaluate_holder(&self, holder: &CaseHolder) -> Result<Tally, StoreError> {
        let mut tally = Tally::default();
        let Some(checklist) = self.catalog.for_holder(holder.role, holder.identity) else {
            tracing::debug!(holder = %holder.id, "no checklist for holder");
            return Ok(tally);
        };

        let individuals = order_individuals(self.store.individuals_of(holder.id)?);
        let organization = self.store.organization_of(holder.id)?;
        let household = TargetRef::CaseHolder(holder.id);

        for name in &checklist.individual_fields {
            if individuals.is_empty() {
                tally.miss(Requirement::field(None, name));
            }
            for person in &individuals {
                tally.check(field_present(&person.fields, name), || {
                    Requirement::field(Some(TargetRef::Individual(person.id)), name)
                });
            }
        }

        for name in &checklist.organization_fields {
            match &organization {
                Some(org) => tally.check(field_present(&org.fields, name), || {
                    Requirement::field(Some(TargetRef::Organization(org.id)), name)
                }),
                None => tally.miss(Requirement::field(None, name)),
            }
        }

        // Owners may keep role-dependent artifacts on any of their properties.
        let owner_scope: Vec<TargetRef> = if holder.role == HolderRole::Owner {
            std::iter::once(household)
                .chain(
                    self.store
                        .properties_of(holder.id)?
                        .into_iter()
                        .map(|property| TargetRef::Property(property.id)),
                )
                .collect()
        } else {
            vec![household]
        };

        let mut attached = AttachedKinds::new(&*self.store);
        for &kind in &checklist.documents {
            match rule_for(kind) {
                RuleClass::PerIndividual => {
                    if individuals.is_empty() {
                        tally.miss(Requirement::document(None, kind));
                    }
                    for person in &individuals {
                        let owner = TargetRef::Individual(person.id);
                        let ok = attached.has(owner, kind)?;
                        tally.check(ok, || Requirement::document(Some(owner), kind));
                    }
                }
                RuleClass::Organization => match &organization {
                    Some(org) => {
                        let owner = TargetRef::Organization(org.id);
                        let ok = attached.has(owner, kind)?;
                        tally.check(ok, || Requirement::document(Some(owner), kind));
                    }
                    None => tally.miss(Requirement::document(None, kind)),
                },
                RuleClass::RoleDependent | RuleClass::PropertyOnly => {
                    let ok = attached.any(&owner_scope, kind)?;
                    tally.check(ok, || Requirement::document(Some(household), kind));
                }
                RuleClass::Household => {
                    let ok = attached.has(household, kind)?;
                    tally.check(ok, || Requirement::document(Some(household), kind));
                }
            }
        }
        Ok(tally)
    }

    fn evaluate_property(&self, property: &Property) -> Result<Tally, StoreError> {
        let mut tally = Tally::default();
        let checklist = &self.catalog.property;
        let owner = TargetRef::Property(property.id);

        for name in &checklist.fields {
            tally.check(field_present(&property.fields, name), || {
                Requirement::field(Some(owner), name)
            });
        }

        let mut attached = AttachedKinds::new(&*self.store);
        for &kind in &checklist.documents {
            let ok = attached.has(owner, kind)?;
            tally.check(ok, || Requirement::document(Some(owner), kind));
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HolderChecklist, PropertyChecklist};
    use dossier_model::{
        ArtifactMetadata, ContentLocator, Document, DocumentKey, IdentityKind, Individual,
    };
    use dossier_store::{CaseRepository, DocumentStore, MemoryStore};

    fn attach(
        store: &MemoryStore,
        locator: &str,
        kind: DocumentKind,
        owner: TargetRef,
    ) -> Document {
        store
            .insert_unique(Document::new(
                DocumentKey::new(ContentLocator::new(locator).unwrap(), kind, owner),
                ArtifactMetadata::new(locator, "application/pdf", 1),
            ))
            .unwrap()
    }

    fn holder_of(role: HolderRole) -> CaseHolder {
        CaseHolder::new(IdentityKind::Individual, role)
    }

    fn tenant_catalog() -> Arc<RequirementCatalog> {
        Arc::new(
            RequirementCatalog::new().with_holder(
                HolderChecklist::new(HolderRole::Tenant, IdentityKind::Individual)
                    .with_individual_field("last_name")
                    .with_document(DocumentKind::IdentityDocument)
                    .with_document(DocumentKind::TaxNotice),
            ),
        )
    }

    #[test]
    fn empty_file_is_not_started() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Tenant));
        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());

        let update = aggregator.recompute_holder(holder).unwrap();
        assert_eq!(update.current, CompletionStatus::NotStarted);
        // One missing unit each for the field and the identity document, plus the tax notice.
        assert_eq!(update.total, 3);
        assert_eq!(update.satisfied, 0);
        assert!(!update.changed());
    }

    #[test]
    fn each_individual_counts() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Tenant));
        let alice = store
            .insert_individual(Individual::new(holder, true).with_field("last_name", "Martin"))
            .unwrap();
        store.insert_individual(Individual::new(holder, false)).unwrap();
        let alice_ref = TargetRef::Individual(alice);
        attach(&store, "blob://id-a", DocumentKind::IdentityDocument, alice_ref);

        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());
        let update = aggregator.recompute_holder(holder).unwrap();

        assert_eq!(update.total, 5);
        assert_eq!(update.satisfied, 2);
        assert_eq!(update.current, CompletionStatus::Partial);
        assert_eq!(store.holder(holder).unwrap().unwrap().status, CompletionStatus::Partial);
    }

    #[test]
    fn no_catalog_entry_is_not_started() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Lead));
        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());
        let update = aggregator.recompute_holder(holder).unwrap();
        assert_eq!(update.current, CompletionStatus::NotStarted);
        assert_eq!(update.total, 0);
    }

    #[test]
    fn owner_insurance_on_property_counts() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Owner));
        let property = store.insert_property(Property::new(holder)).unwrap();
        attach(
            &store,
            "blob://insurance",
            DocumentKind::InsuranceCertificate,
            TargetRef::Property(property),
        );
        let catalog = Arc::new(RequirementCatalog::new().with_holder(
            HolderChecklist::new(HolderRole::Owner, IdentityKind::Individual)
                .with_document(DocumentKind::InsuranceCertificate),
        ));

        let update = CompletionAggregator::new(Arc::clone(&store), catalog)
            .recompute_holder(holder)
            .unwrap();
        assert_eq!(update.current, CompletionStatus::PendingCheck);
    }

    #[test]
    fn property_status_follows_its_checklist() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Owner));
        let property = store
            .insert_property(Property::new(holder).with_field("address", "1 rue de la Paix"))
            .unwrap();
        let catalog = Arc::new(RequirementCatalog::new().with_property(
            PropertyChecklist::default()
                .with_field("address")
                .with_document(DocumentKind::Diagnostics),
        ));
        let aggregator = CompletionAggregator::new(Arc::clone(&store), catalog);

        let partial = aggregator.recompute_property(property).unwrap();
        assert_eq!(partial.current, CompletionStatus::Partial);
        assert_eq!(
            partial.missing,
            vec![Requirement::document(
                Some(TargetRef::Property(property)),
                DocumentKind::Diagnostics
            )]
        );

        attach(&store, "blob://dpe", DocumentKind::Diagnostics, TargetRef::Property(property));
        let complete = aggregator.recompute_property(property).unwrap();
        assert_eq!(complete.previous, CompletionStatus::Partial);
        assert_eq!(complete.current, CompletionStatus::PendingCheck);
        assert!(complete.missing.is_empty());
    }

    #[test]
    fn completed_is_demoted_on_regression() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Tenant));
        let person = store
            .insert_individual(Individual::new(holder, true).with_field("last_name", "Martin"))
            .unwrap();
        let person_ref = TargetRef::Individual(person);
        let id_doc = attach(&store, "blob://id", DocumentKind::IdentityDocument, person_ref);
        attach(&store, "blob://tax", DocumentKind::TaxNotice, TargetRef::CaseHolder(holder));
        store.set_holder_status(holder, CompletionStatus::Completed).unwrap();

        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());
        assert_eq!(
            aggregator.recompute_holder(holder).unwrap().current,
            CompletionStatus::Completed
        );

        store.remove(id_doc.id).unwrap();
        let update = aggregator.recompute_holder(holder).unwrap();
        assert_eq!(update.previous, CompletionStatus::Completed);
        assert_eq!(update.current, CompletionStatus::Partial);
    }

    #[test]
    fn publish_runs_under_the_subject_lock() {
        let store = Arc::new(MemoryStore::new());
        let holder = store.insert_holder(holder_of(HolderRole::Tenant));
        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());
        let subject = StatusSubject::CaseHolder(holder);

        let mut published = None;
        let update = aggregator
            .recompute_holder_with(holder, |update| {
                assert!(aggregator.locks.handle(&subject).try_lock().is_none());
                published = Some(update.current);
            })
            .unwrap();
        assert_eq!(published, Some(update.current));
    }

    #[test]
    fn publish_is_skipped_on_error() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = CompletionAggregator::new(store, tenant_catalog());
        let mut called = false;
        let result = aggregator.recompute_property_with(PropertyId::new(), |_| called = true);
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn idle_subject_locks_are_pruned() {
        let store = Arc::new(MemoryStore::new());
        let first = store.insert_holder(holder_of(HolderRole::Tenant));
        let second = store.insert_holder(holder_of(HolderRole::Tenant));
        let aggregator = CompletionAggregator::new(Arc::clone(&store), tenant_catalog());

        aggregator.recompute_holder(first).unwrap();
        aggregator.recompute_holder(second).unwrap();
        assert_eq!(aggregator.prune_locks(), 2);
        assert_eq!(aggregator.prune_locks(), 0);
    }

    #[test]
    fn unknown_subject_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = CompletionAggregator::new(store, tenant_catalog());
        assert!(matches!(
            aggregator.recompute_holder(CaseHolderId::new()),
            Err(EngineError::HolderNotFound(_))
        ));
        assert!(matches!(
            aggregator.recompute_property(PropertyId::new()),
            Err(EngineError::PropertyNotFound(_))
        ));
    }
}
