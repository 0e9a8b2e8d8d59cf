//! Testing utilities for the dossier workspace
//!
//! Case-file fixtures over a [`MemoryStore`] and the standard checklists.

#![allow(missing_docs)]

use dossier_core::{DossierEngine, HolderChecklist, PropertyChecklist, RequirementCatalog};
use dossier_model::{
    CaseHolder, CaseHolderId, DocumentKind, HolderRole, IdentityKind, Individual, IndividualId,
    Lease, LeaseId, LeaseSide, Organization, Property, PropertyId,
};
use dossier_store::MemoryStore;
use std::sync::Arc;

/// A holder and the ids created with it
#[derive(Debug, Clone)]
pub struct CaseFixture {
    pub store: Arc<MemoryStore>,
    pub holder: CaseHolderId,
    pub individuals: Vec<IndividualId>,
    pub property: Option<PropertyId>,
    pub lease: Option<LeaseId>,
}

impl CaseFixture {
    /// Engine over this fixture's store
    pub fn engine(&self, catalog: RequirementCatalog) -> DossierEngine<MemoryStore> {
        DossierEngine::new(Arc::clone(&self.store), catalog)
    }

    /// Id of the `n`th individual created
    pub fn individual(&self, n: usize) -> IndividualId {
        self.individuals[n]
    }

    /// Property id; panics when the fixture has none
    pub fn property_id(&self) -> PropertyId {
        self.property.expect("fixture has no property")
    }
}

fn holder_with(store: &Arc<MemoryStore>, role: HolderRole, primaries: &[bool]) -> CaseFixture {
    let holder = store.insert_holder(CaseHolder::new(IdentityKind::Individual, role));
    let individuals = primaries
        .iter()
        .enumerate()
        .map(|(i, primary)| {
            store
                .insert_individual(
                    Individual::new(holder, *primary)
                        .with_field("first_name", format!("Person {i}"))
                        .with_field("last_name", "Martin"),
                )
                .expect("holder exists")
        })
        .collect();
    CaseFixture {
        store: Arc::clone(store),
        holder,
        individuals,
        property: None,
        lease: None,
    }
}

/// Tenant with a single primary individual
pub fn tenant_with_individual() -> CaseFixture {
    holder_with(&Arc::new(MemoryStore::new()), HolderRole::Tenant, &[true])
}

/// Tenant whose individuals carry the given primary flags, in creation order
pub fn tenant_with_individuals(primaries: &[bool]) -> CaseFixture {
    holder_with(&Arc::new(MemoryStore::new()), HolderRole::Tenant, primaries)
}

/// Tenant with no individual yet
pub fn empty_tenant() -> CaseFixture {
    holder_with(&Arc::new(MemoryStore::new()), HolderRole::Tenant, &[])
}

/// Individual owner with one primary individual and one property
pub fn owner_with_property() -> CaseFixture {
    let store = Arc::new(MemoryStore::new());
    let mut fixture = holder_with(&store, HolderRole::Owner, &[true]);
    let property = store
        .insert_property(Property::new(fixture.holder).with_field("address", "12 rue des Lilas"))
        .expect("owner exists");
    fixture.property = Some(property);
    fixture
}

/// Organization owner with registered organization and one property
pub fn organization_owner() -> CaseFixture {
    let store = Arc::new(MemoryStore::new());
    let holder =
        store.insert_holder(CaseHolder::new(IdentityKind::Organization, HolderRole::Owner));
    store
        .insert_organization(Organization::new(holder).with_field("legal_name", "SCI Lilas"))
        .expect("holder exists");
    let property = store
        .insert_property(Property::new(holder).with_field("address", "12 rue des Lilas"))
        .expect("owner exists");
    CaseFixture {
        store,
        holder,
        individuals: Vec::new(),
        property: Some(property),
        lease: None,
    }
}

/// Tenant renting the property of an owner, both in one store
///
/// Returns `(tenant, owner)`; the tenant fixture carries the property and lease.
pub fn leased_property() -> (CaseFixture, CaseFixture) {
    let owner = owner_with_property();
    let mut tenant = holder_with(&owner.store, HolderRole::Tenant, &[true]);
    let lease = owner
        .store
        .insert_lease(
            Lease::new(owner.property_id())
                .with_party(owner.holder, LeaseSide::Owner)
                .with_party(tenant.holder, LeaseSide::Tenant),
        )
        .expect("property exists");
    tenant.property = owner.property;
    tenant.lease = Some(lease);
    (tenant, owner)
}

/// Checklists used across the integration tests
pub fn standard_catalog() -> RequirementCatalog {
    RequirementCatalog::new()
        .with_holder(
            HolderChecklist::new(HolderRole::Tenant, IdentityKind::Individual)
                .with_individual_field("first_name")
                .with_individual_field("last_name")
                .with_document(DocumentKind::IdentityDocument)
                .with_document(DocumentKind::ProofOfIncome)
                .with_document(DocumentKind::InsuranceCertificate),
        )
        .with_holder(
            HolderChecklist::new(HolderRole::Owner, IdentityKind::Individual)
                .with_individual_field("last_name")
                .with_document(DocumentKind::IdentityDocument)
                .with_document(DocumentKind::InsuranceCertificate)
                .with_document(DocumentKind::BankAccountProof),
        )
        .with_holder(
            HolderChecklist::new(HolderRole::Owner, IdentityKind::Organization)
                .with_organization_field("legal_name")
                .with_document(DocumentKind::RegistrationCertificate)
                .with_document(DocumentKind::Bylaws),
        )
        .with_property(
            PropertyChecklist::default()
                .with_field("address")
                .with_document(DocumentKind::Diagnostics)
                .with_document(DocumentKind::TitleDeed),
        )
}
