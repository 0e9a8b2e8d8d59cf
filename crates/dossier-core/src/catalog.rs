//! Requirement catalog
//!
//! Which fields and document kinds make a case holder or a property complete.
//! Loaded from configuration; the engine never guesses a checklist.

use crate::error::CatalogError;
use dossier_model::{DocumentKind, HolderRole, IdentityKind, TargetRef};
use dossier_resolver::{rule_for, RuleClass};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Checklist for one (role, identity kind) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderChecklist {
    pub role: HolderRole,
    pub identity: IdentityKind,
    /// Fields every individual must carry
    #[serde(default)]
    pub individual_fields: Vec<String>,
    /// Fields the organization must carry
    #[serde(default)]
    pub organization_fields: Vec<String>,
    #[serde(default)]
    pub documents: Vec<DocumentKind>,
}

impl HolderChecklist {
    /// Empty checklist
    #[must_use]
    pub fn new(role: HolderRole, identity: IdentityKind) -> Self {
        Self {
            role,
            identity,
            individual_fields: Vec::new(),
            organization_fields: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// With a required individual field
    #[must_use]
    pub fn with_individual_field(mut self, name: impl Into<String>) -> Self {
        self.individual_fields.push(name.into());
        self
    }

    /// With a required organization field
    #[must_use]
    pub fn with_organization_field(mut self, name: impl Into<String>) -> Self {
        self.organization_fields.push(name.into());
        self
    }

    /// With a required document kind
    #[must_use]
    pub fn with_document(mut self, kind: DocumentKind) -> Self {
        self.documents.push(kind);
        self
    }

    /// Nothing required
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individual_fields.is_empty()
            && self.organization_fields.is_empty()
            && self.documents.is_empty()
    }
}

/// Checklist shared by every property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChecklist {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub documents: Vec<DocumentKind>,
}

impl PropertyChecklist {
    /// With a required field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// With a required document kind
    #[must_use]
    pub fn with_document(mut self, kind: DocumentKind) -> Self {
        self.documents.push(kind);
        self
    }
}

/// All checklists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementCatalog {
    #[serde(default, rename = "holder")]
    pub holders: Vec<HolderChecklist>,
    #[serde(default)]
    pub property: PropertyChecklist,
}

impl RequirementCatalog {
    /// Empty catalog; every subject classifies as not started
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a holder checklist
    #[must_use]
    pub fn with_holder(mut self, checklist: HolderChecklist) -> Self {
        self.holders.push(checklist);
        self
    }

    /// Replace the property checklist
    #[must_use]
    pub fn with_property(mut self, checklist: PropertyChecklist) -> Self {
        self.property = checklist;
        self
    }

    /// Parse and validate TOML
    ///
    /// ```toml
    /// [[holder]]
    /// role = "tenant"
    /// identity = "individual"
    /// individual_fields = ["first_name", "last_name"]
    /// documents = ["identity_document", "proof_of_income"]
    ///
    /// [property]
    /// fields = ["address"]
    /// documents = ["diagnostics", "title_deed"]
    /// ```
    ///
    /// # Errors
    /// Parse failure or a [`validate`](Self::validate) violation.
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Unreadable file, parse failure or a validation violation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject checklists that could never be satisfied
    ///
    /// # Errors
    /// A duplicate (role, identity) entry, a property-only kind on a holder
    /// checklist, or a property checklist kind that never lands on a property.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for checklist in &self.holders {
            if !seen.insert((checklist.role, checklist.identity)) {
                return Err(CatalogError::DuplicateEntry {
                    role: format!("{:?}", checklist.role).to_lowercase(),
                    identity: format!("{:?}", checklist.identity).to_lowercase(),
                });
            }
            if let Some(&kind) = checklist
                .documents
                .iter()
                .find(|kind| rule_for(**kind) == RuleClass::PropertyOnly)
            {
                return Err(CatalogError::MisplacedKind {
                    kind,
                    scope: "holder",
                });
            }
        }
        if let Some(&kind) = self.property.documents.iter().find(|kind| {
            !matches!(
                rule_for(**kind),
                RuleClass::PropertyOnly | RuleClass::RoleDependent
            )
        }) {
            return Err(CatalogError::MisplacedKind {
                kind,
                scope: "property",
            });
        }
        Ok(())
    }

    /// Checklist for a holder's role and identity kind
    #[must_use]
    pub fn for_holder(&self, role: HolderRole, identity: IdentityKind) -> Option<&HolderChecklist> {
        self.holders
            .iter()
            .find(|checklist| checklist.role == role && checklist.identity == identity)
    }
}

/// One unmet requirement, for banner components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "requirement", rename_all = "snake_case")]
pub enum Requirement {
    /// A field is blank or absent; `owner` is `None` when the entity itself is missing
    Field {
        owner: Option<TargetRef>,
        name: String,
    },
    /// No document of `kind` is attached; `owner` as above
    Document {
        owner: Option<TargetRef>,
        kind: DocumentKind,
    },
}

impl Requirement {
    pub(crate) fn field(owner: Option<TargetRef>, name: &str) -> Self {
        Self::Field {
            owner,
            name: name.to_string(),
        }
    }

    pub(crate) const fn document(owner: Option<TargetRef>, kind: DocumentKind) -> Self {
        Self::Document { owner, kind }
    }
}
