//! Storage errors

use dossier_model::{CaseHolderId, DocumentId, DocumentKey, PropertyId};

/// Errors raised by storage backends
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Conditional write lost: a row with this identity key already exists
    #[error("document already exists for {key}")]
    Conflict { key: Box<DocumentKey> },

    /// Document id does not resolve
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Case holder id does not resolve
    #[error("case holder not found: {0}")]
    HolderNotFound(CaseHolderId),

    /// Property id does not resolve
    #[error("property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Holder already has its single organization
    #[error("case holder {0} already has an organization")]
    OrganizationExists(CaseHolderId),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create conflict error for key
    #[inline]
    #[must_use]
    pub fn conflict(key: DocumentKey) -> Self {
        Self::Conflict { key: Box::new(key) }
    }

    /// Whether this is a lost conditional write
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
