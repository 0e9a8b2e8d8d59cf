//! Case graph entities
//!
//! Plain data: behavior lives in the resolver, store and aggregator crates.

use crate::ids::{CaseHolderId, IndividualId, LeaseId, OrganizationId, PropertyId};
use crate::status::CompletionStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form named attributes checked by the completion checklists
pub type FieldMap = BTreeMap<String, String>;

/// True when `name` is set to a non-blank value
#[inline]
#[must_use]
pub fn field_present(fields: &FieldMap, name: &str) -> bool {
    fields.get(name).is_some_and(|value| !value.trim().is_empty())
}

/// Legal nature of a case holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Individual,
    Organization,
}

/// Position of a case holder in the lease workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderRole {
    Owner,
    Tenant,
    Lead,
}

/// Root of a case file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseHolder {
    pub id: CaseHolderId,
    pub identity: IdentityKind,
    pub role: HolderRole,
    #[serde(default)]
    pub status: CompletionStatus,
}

impl CaseHolder {
    /// New holder with a fresh id and `NotStarted` status
    #[must_use]
    pub fn new(identity: IdentityKind, role: HolderRole) -> Self {
        Self {
            id: CaseHolderId::new(),
            identity,
            role,
            status: CompletionStatus::NotStarted,
        }
    }
}

/// A person of a case holder's household
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub holder_id: CaseHolderId,
    #[serde(default)]
    pub is_primary: bool,
    /// Insertion order within the store; assigned on insert
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Individual {
    /// New individual attached to `holder_id`
    #[must_use]
    pub fn new(holder_id: CaseHolderId, is_primary: bool) -> Self {
        Self {
            id: IndividualId::new(),
            holder_id,
            is_primary,
            seq: 0,
            fields: FieldMap::new(),
        }
    }

    /// Set a field value
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// The organization a case holder represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub holder_id: CaseHolderId,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Organization {
    /// New organization attached to `holder_id`
    #[must_use]
    pub fn new(holder_id: CaseHolderId) -> Self {
        Self {
            id: OrganizationId::new(),
            holder_id,
            fields: FieldMap::new(),
        }
    }

    /// Set a field value
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A property owned by an OWNER case holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: CaseHolderId,
    #[serde(default)]
    pub status: CompletionStatus,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Property {
    /// New property owned by `owner_id`
    #[must_use]
    pub fn new(owner_id: CaseHolderId) -> Self {
        Self {
            id: PropertyId::new(),
            owner_id,
            status: CompletionStatus::NotStarted,
            fields: FieldMap::new(),
        }
    }

    /// Set a field value
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Side of a lease a party stands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseSide {
    Owner,
    Tenant,
}

/// A case holder participating in a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseParty {
    pub holder_id: CaseHolderId,
    pub side: LeaseSide,
}

/// A lease over one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub property_id: PropertyId,
    #[serde(default)]
    pub parties: Vec<LeaseParty>,
}

impl Lease {
    /// New lease over `property_id` without parties
    #[must_use]
    pub fn new(property_id: PropertyId) -> Self {
        Self {
            id: LeaseId::new(),
            property_id,
            parties: Vec::new(),
        }
    }

    /// Add a party
    #[must_use]
    pub fn with_party(mut self, holder_id: CaseHolderId, side: LeaseSide) -> Self {
        self.parties.push(LeaseParty { holder_id, side });
        self
    }

    /// Whether `holder_id` is a party on any side
    #[must_use]
    pub fn has_party(&self, holder_id: CaseHolderId) -> bool {
        self.parties.iter().any(|p| p.holder_id == holder_id)
    }
}
