//! Storage contract consumed by the engine

use crate::error::StoreError;
use dossier_model::{
    ArtifactMetadata, CaseHolder, CaseHolderId, CompletionStatus, Document, DocumentId,
    DocumentKey, Individual, Lease, LeaseId, Organization, Property, PropertyId, TargetRef,
};

/// Document persistence with a conditional insert
pub trait DocumentStore: Send + Sync {
    /// Look up the row matching the full identity key
    ///
    /// # Errors
    /// Backend failures only; absence is `Ok(None)`.
    fn find(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError>;

    /// Insert only if no row holds the same identity key
    ///
    /// # Errors
    /// [`StoreError::Conflict`] when the key is already taken.
    fn insert_unique(&self, document: Document) -> Result<Document, StoreError>;

    /// Overwrite descriptive metadata of an existing row
    ///
    /// # Errors
    /// [`StoreError::DocumentNotFound`] when the id does not resolve.
    fn update_metadata(
        &self,
        id: DocumentId,
        metadata: &ArtifactMetadata,
    ) -> Result<Document, StoreError>;

    /// All documents attached to `owner`
    ///
    /// # Errors
    /// Backend failures only.
    fn documents_for(&self, owner: &TargetRef) -> Result<Vec<Document>, StoreError>;

    /// Delete a row. Staff action; the engine never calls this.
    ///
    /// # Errors
    /// Backend failures only; a missing row is `Ok(None)`.
    fn remove(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Number of stored documents
    fn document_count(&self) -> usize;
}

/// Read access to the case graph plus derived-status writes
pub trait CaseRepository: Send + Sync {
    /// Case holder by id
    ///
    /// # Errors
    /// Backend failures only.
    fn holder(&self, id: CaseHolderId) -> Result<Option<CaseHolder>, StoreError>;

    /// Individuals of a holder, in no particular order
    ///
    /// # Errors
    /// Backend failures only.
    fn individuals_of(&self, holder: CaseHolderId) -> Result<Vec<Individual>, StoreError>;

    /// Organization of a holder
    ///
    /// # Errors
    /// Backend failures only.
    fn organization_of(&self, holder: CaseHolderId) -> Result<Option<Organization>, StoreError>;

    /// Version of a holder's graph, bumped whenever its individuals or
    /// organization change
    ///
    /// Cached graphs are only reused while this value is unchanged. An
    /// unknown holder reports `0`.
    ///
    /// # Errors
    /// Backend failures only.
    fn graph_version(&self, holder: CaseHolderId) -> Result<u64, StoreError>;

    /// Property by id
    ///
    /// # Errors
    /// Backend failures only.
    fn property(&self, id: PropertyId) -> Result<Option<Property>, StoreError>;

    /// Properties owned by a holder
    ///
    /// # Errors
    /// Backend failures only.
    fn properties_of(&self, owner: CaseHolderId) -> Result<Vec<Property>, StoreError>;

    /// Lease by id
    ///
    /// # Errors
    /// Backend failures only.
    fn lease(&self, id: LeaseId) -> Result<Option<Lease>, StoreError>;

    /// Persist a derived holder status
    ///
    /// # Errors
    /// [`StoreError::HolderNotFound`] when the id does not resolve.
    fn set_holder_status(
        &self,
        id: CaseHolderId,
        status: CompletionStatus,
    ) -> Result<(), StoreError>;

    /// Persist a derived property status
    ///
    /// # Errors
    /// [`StoreError::PropertyNotFound`] when the id does not resolve.
    fn set_property_status(
        &self,
        id: PropertyId,
        status: CompletionStatus,
    ) -> Result<(), StoreError>;
}

/// A backend providing both halves of the contract
pub trait DossierStore: DocumentStore + CaseRepository {}

impl<T: DocumentStore + CaseRepository> DossierStore for T {}
