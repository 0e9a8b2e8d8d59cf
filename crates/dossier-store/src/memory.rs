//! In-memory reference store
//!
//! Thread-safe via [`DashMap`]. The identity-key index is claimed through the
//! map entry API, so [`DocumentStore::insert_unique`] is a true conditional
//! write: two racing inserts for the same key yield one row and one
//! [`StoreError::Conflict`].

use crate::error::StoreError;
use crate::traits::{CaseRepository, DocumentStore};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dossier_model::{
    ArtifactMetadata, CaseHolder, CaseHolderId, CompletionStatus, Document, DocumentId,
    DocumentKey, Individual, IndividualId, Lease, LeaseId, Organization, Property, PropertyId,
    TargetRef,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Case graph and documents held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    holders: DashMap<CaseHolderId, CaseHolder>,
    individuals: DashMap<IndividualId, Individual>,
    organizations: DashMap<CaseHolderId, Organization>,
    properties: DashMap<PropertyId, Property>,
    leases: DashMap<LeaseId, Lease>,

    documents: DashMap<DocumentId, Document>,
    /// Identity key -> row id (uniqueness constraint)
    by_key: DashMap<DocumentKey, DocumentId>,
    /// Reverse index: owner -> row ids
    by_owner: DashMap<TargetRef, Vec<DocumentId>>,

    /// Per-holder graph version, bumped on individual and organization writes
    graph_versions: DashMap<CaseHolderId, u64>,
    /// Insertion counter for individual ordering
    seq: AtomicU64,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a case holder
    pub fn insert_holder(&self, holder: CaseHolder) -> CaseHolderId {
        let id = holder.id;
        self.holders.insert(id, holder);
        self.bump_graph(id);
        id
    }

    fn bump_graph(&self, holder: CaseHolderId) {
        *self.graph_versions.entry(holder).or_default() += 1;
    }

    /// Insert an individual, stamping its insertion sequence
    ///
    /// # Errors
    /// [`StoreError::HolderNotFound`] when the owning holder is unknown
    pub fn insert_individual(
        &self,
        mut individual: Individual,
    ) -> Result<IndividualId, StoreError> {
        let holder_id = individual.holder_id;
        if !self.holders.contains_key(&holder_id) {
            return Err(StoreError::HolderNotFound(holder_id));
        }
        individual.seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let id = individual.id;
        self.individuals.insert(id, individual);
        self.bump_graph(holder_id);
        Ok(id)
    }

    /// Attach the holder's single organization
    ///
    /// # Errors
    /// - [`StoreError::HolderNotFound`] when the owning holder is unknown
    /// - [`StoreError::OrganizationExists`] when one is already attached
    pub fn insert_organization(&self, organization: Organization) -> Result<(), StoreError> {
        let holder_id = organization.holder_id;
        if !self.holders.contains_key(&holder_id) {
            return Err(StoreError::HolderNotFound(holder_id));
        }
        match self.organizations.entry(holder_id) {
            Entry::Occupied(_) => Err(StoreError::OrganizationExists(holder_id)),
            Entry::Vacant(slot) => {
                slot.insert(organization);
                self.bump_graph(holder_id);
                Ok(())
            }
        }
    }

    /// Insert a property
    ///
    /// # Errors
    /// [`StoreError::HolderNotFound`] when the owner is unknown
    pub fn insert_property(&self, property: Property) -> Result<PropertyId, StoreError> {
        if !self.holders.contains_key(&property.owner_id) {
            return Err(StoreError::HolderNotFound(property.owner_id));
        }
        let id = property.id;
        self.properties.insert(id, property);
        Ok(id)
    }

    /// Insert a lease
    ///
    /// # Errors
    /// [`StoreError::PropertyNotFound`] when the leased property is unknown
    pub fn insert_lease(&self, lease: Lease) -> Result<LeaseId, StoreError> {
        if !self.properties.contains_key(&lease.property_id) {
            return Err(StoreError::PropertyNotFound(lease.property_id));
        }
        let id = lease.id;
        self.leases.insert(id, lease);
        Ok(id)
    }

    /// Snapshot of every stored document
    #[must_use]
    pub fn all_documents(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.documents.iter().map(|e| e.value().clone()).collect();
        docs.sort_by_key(|d| d.id);
        docs
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
        let Some(id) = self.by_key.get(key).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.documents.get(&id).map(|e| e.value().clone()))
    }

    fn insert_unique(&self, document: Document) -> Result<Document, StoreError> {
        let key = document.key();
        match self.by_key.entry(key) {
            Entry::Occupied(slot) => {
                tracing::debug!(key = %slot.key(), "conditional insert lost");
                Err(StoreError::conflict(slot.key().clone()))
            }
            Entry::Vacant(slot) => {
                // Row and reverse index land before the key guard is released.
                self.documents.insert(document.id, document.clone());
                self.by_owner
                    .entry(document.owner)
                    .or_default()
                    .push(document.id);
                slot.insert(document.id);
                Ok(document)
            }
        }
    }

    fn update_metadata(
        &self,
        id: DocumentId,
        metadata: &ArtifactMetadata,
    ) -> Result<Document, StoreError> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        entry.apply_metadata(metadata);
        Ok(entry.value().clone())
    }

    fn documents_for(&self, owner: &TargetRef) -> Result<Vec<Document>, StoreError> {
        let ids = self
            .by_owner
            .get(owner)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.documents.get(id).map(|e| e.value().clone()))
            .collect())
    }

    fn remove(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let Some((_, document)) = self.documents.remove(&id) else {
            return Ok(None);
        };
        self.by_key.remove(&document.key());
        if let Some(mut ids) = self.by_owner.get_mut(&document.owner) {
            ids.retain(|other| *other != id);
        }
        Ok(Some(document))
    }

    fn document_count(&self) -> usize {
        self.documents.len()
    }
}

impl CaseRepository for MemoryStore {
    fn holder(&self, id: CaseHolderId) -> Result<Option<CaseHolder>, StoreError> {
        Ok(self.holders.get(&id).map(|e| e.value().clone()))
    }

    fn individuals_of(&self, holder: CaseHolderId) -> Result<Vec<Individual>, StoreError> {
        Ok(self
            .individuals
            .iter()
            .filter(|e| e.value().holder_id == holder)
            .map(|e| e.value().clone())
            .collect())
    }

    fn organization_of(&self, holder: CaseHolderId) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.get(&holder).map(|e| e.value().clone()))
    }

    fn graph_version(&self, holder: CaseHolderId) -> Result<u64, StoreError> {
        Ok(self.graph_versions.get(&holder).map_or(0, |e| *e.value()))
    }

    fn property(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self.properties.get(&id).map(|e| e.value().clone()))
    }

    fn properties_of(&self, owner: CaseHolderId) -> Result<Vec<Property>, StoreError> {
        let mut owned: Vec<Property> = self
            .properties
            .iter()
            .filter(|e| e.value().owner_id == owner)
            .map(|e| e.value().clone())
            .collect();
        owned.sort_by_key(|p| p.id);
        Ok(owned)
    }

    fn lease(&self, id: LeaseId) -> Result<Option<Lease>, StoreError> {
        Ok(self.leases.get(&id).map(|e| e.value().clone()))
    }

    fn set_holder_status(
        &self,
        id: CaseHolderId,
        status: CompletionStatus,
    ) -> Result<(), StoreError> {
        let mut holder = self
            .holders
            .get_mut(&id)
            .ok_or(StoreError::HolderNotFound(id))?;
        holder.status = status;
        Ok(())
    }

    fn set_property_status(
        &self,
        id: PropertyId,
        status: CompletionStatus,
    ) -> Result<(), StoreError> {
        let mut property = self
            .properties
            .get_mut(&id)
            .ok_or(StoreError::PropertyNotFound(id))?;
        property.status = status;
        Ok(())
    }
}
