//! Polymorphic document ownership
//!
//! A document belongs to exactly one of five entity kinds. [`TargetRef`]
//! makes that a sum type; [`OwnerColumns`] is the flat nullable-column shape
//! a row store persists, convertible back only when exactly one column is set.

use crate::error::ModelError;
use crate::ids::{CaseHolderId, IndividualId, LeaseId, OrganizationId, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single entity a document is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
    /// A person of the case holder
    Individual(IndividualId),
    /// The case holder's organization
    Organization(OrganizationId),
    /// The case holder itself (household-level documents)
    CaseHolder(CaseHolderId),
    /// A property
    Property(PropertyId),
    /// A lease
    Lease(LeaseId),
}

impl TargetRef {
    /// Entity kind label
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        match self {
            Self::Individual(_) => "individual",
            Self::Organization(_) => "organization",
            Self::CaseHolder(_) => "case_holder",
            Self::Property(_) => "property",
            Self::Lease(_) => "lease",
        }
    }

    /// Flatten into row columns
    #[must_use]
    pub fn to_columns(&self) -> OwnerColumns {
        let mut columns = OwnerColumns::default();
        match *self {
            Self::Individual(id) => columns.individual_id = Some(id),
            Self::Organization(id) => columns.organization_id = Some(id),
            Self::CaseHolder(id) => columns.case_holder_id = Some(id),
            Self::Property(id) => columns.property_id = Some(id),
            Self::Lease(id) => columns.lease_id = Some(id),
        }
        columns
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual(id) => write!(f, "individual:{id}"),
            Self::Organization(id) => write!(f, "organization:{id}"),
            Self::CaseHolder(id) => write!(f, "case_holder:{id}"),
            Self::Property(id) => write!(f, "property:{id}"),
            Self::Lease(id) => write!(f, "lease:{id}"),
        }
    }
}

/// Nullable owner foreign keys as stored on a document row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerColumns {
    pub individual_id: Option<IndividualId>,
    pub organization_id: Option<OrganizationId>,
    pub case_holder_id: Option<CaseHolderId>,
    pub property_id: Option<PropertyId>,
    pub lease_id: Option<LeaseId>,
}

impl OwnerColumns {
    /// Number of populated columns
    #[must_use]
    pub fn populated(&self) -> usize {
        [
            self.individual_id.is_some(),
            self.organization_id.is_some(),
            self.case_holder_id.is_some(),
            self.property_id.is_some(),
            self.lease_id.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl TryFrom<OwnerColumns> for TargetRef {
    type Error = ModelError;

    fn try_from(columns: OwnerColumns) -> Result<Self, Self::Error> {
        let populated = columns.populated();
        if populated != 1 {
            return Err(ModelError::OwnerCardinality { populated });
        }
        let target = match columns {
            OwnerColumns { individual_id: Some(id), .. } => Self::Individual(id),
            OwnerColumns { organization_id: Some(id), .. } => Self::Organization(id),
            OwnerColumns { case_holder_id: Some(id), .. } => Self::CaseHolder(id),
            OwnerColumns { property_id: Some(id), .. } => Self::Property(id),
            OwnerColumns { lease_id: Some(id), .. } => Self::Lease(id),
            _ => return Err(ModelError::OwnerCardinality { populated: 0 }),
        };
        Ok(target)
    }
}
