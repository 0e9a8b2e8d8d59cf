//! JSON case-file fixtures
//!
//! A fixture describes one holder graph and one submission. Ids are minted
//! when the fixture is seeded into a store.

use anyhow::{Context, Result};
use dossier_core::{BatchItem, ContextRefs};
use dossier_model::{
    CaseHolder, FieldMap, HolderRole, IdentityKind, Individual, Lease, LeaseSide, Organization,
    Property, UploaderId,
};
use dossier_store::MemoryStore;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaseFixture {
    pub(crate) holder: HolderEntry,
    #[serde(default)]
    pub(crate) individuals: Vec<IndividualEntry>,
    #[serde(default)]
    pub(crate) organization: Option<FieldsEntry>,
    /// Property in context; owned by the holder when it is an owner
    #[serde(default)]
    pub(crate) property: Option<FieldsEntry>,
    /// Lease over the property between its owner and the holder
    #[serde(default)]
    pub(crate) lease: bool,
    #[serde(default)]
    pub(crate) uploader: Option<UploaderId>,
    pub(crate) items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct HolderEntry {
    pub(crate) identity: IdentityKind,
    pub(crate) role: HolderRole,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IndividualEntry {
    #[serde(default)]
    pub(crate) is_primary: bool,
    #[serde(default)]
    pub(crate) fields: FieldMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FieldsEntry {
    #[serde(default)]
    pub(crate) fields: FieldMap,
}

impl CaseFixture {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    /// Insert the graph into `store` and return the submission context
    pub(crate) fn seed(&self, store: &MemoryStore) -> Result<ContextRefs> {
        let holder = store.insert_holder(CaseHolder::new(self.holder.identity, self.holder.role));
        for entry in &self.individuals {
            let mut individual = Individual::new(holder, entry.is_primary);
            individual.fields.clone_from(&entry.fields);
            store.insert_individual(individual)?;
        }
        if let Some(entry) = &self.organization {
            let mut organization = Organization::new(holder);
            organization.fields.clone_from(&entry.fields);
            store.insert_organization(organization)?;
        }

        let mut refs = ContextRefs::holder(holder);
        refs.uploader = self.uploader;

        if let Some(entry) = &self.property {
            let owner = if self.holder.role == HolderRole::Owner {
                holder
            } else {
                store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Owner))
            };
            let mut property = Property::new(owner);
            property.fields.clone_from(&entry.fields);
            let property = store.insert_property(property)?;
            refs = refs.with_property(property);

            if self.lease {
                let side = if owner == holder { LeaseSide::Owner } else { LeaseSide::Tenant };
                let mut lease = Lease::new(property).with_party(holder, side);
                if owner != holder {
                    lease = lease.with_party(owner, LeaseSide::Owner);
                }
                refs = refs.with_lease(store.insert_lease(lease)?);
            }
        } else if self.lease {
            tracing::warn!("fixture requests a lease without a property; ignored");
        }
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_store::CaseRepository;
    use pretty_assertions::assert_eq;

    const TENANT: &str = r#"{
        "holder": {"identity": "individual", "role": "tenant"},
        "individuals": [
            {"is_primary": false, "fields": {"last_name": "Martin"}},
            {"is_primary": true, "fields": {"last_name": "Durand"}}
        ],
        "property": {"fields": {"address": "12 rue des Lilas"}},
        "lease": true,
        "items": [
            {"kind": "identity_document", "locator": "blob://id", "party_index": 0},
            {"kind": "insurance_certificate", "locator": "blob://ins", "attach_to_lease": true}
        ]
    }"#;

    #[test]
    fn tenant_fixture_seeds_owner_and_lease() {
        let fixture: CaseFixture = serde_json::from_str(TENANT).unwrap();
        let store = MemoryStore::new();
        let refs = fixture.seed(&store).unwrap();

        assert_eq!(store.individuals_of(refs.holder_id).unwrap().len(), 2);
        let property = store.property(refs.property_id.unwrap()).unwrap().unwrap();
        assert_ne!(property.owner_id, refs.holder_id);
        let lease = store.lease(refs.lease_id.unwrap()).unwrap().unwrap();
        assert!(lease.has_party(refs.holder_id));
        assert!(lease.has_party(property.owner_id));
        assert_eq!(fixture.items.len(), 2);
    }

    #[test]
    fn owner_fixture_owns_its_property() {
        let fixture: CaseFixture = serde_json::from_str(
            r#"{
                "holder": {"identity": "individual", "role": "owner"},
                "property": {},
                "items": []
            }"#,
        )
        .unwrap();
        let store = MemoryStore::new();
        let refs = fixture.seed(&store).unwrap();
        let property = store.property(refs.property_id.unwrap()).unwrap().unwrap();
        assert_eq!(property.owner_id, refs.holder_id);
        assert!(refs.lease_id.is_none());
    }
}
