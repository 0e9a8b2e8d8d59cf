//! Error types for the attachment engine
//!
//! Two tiers:
//! - [`ItemError`]: one artifact failed; captured in its outcome, siblings continue
//! - [`EngineError`]: nothing can be computed (unknown holder, backend down)

use dossier_model::{CaseHolderId, DocumentKey, DocumentKind, PropertyId};
use dossier_resolver::ResolutionError;
use dossier_store::StoreError;
use std::path::PathBuf;

/// Whole-call failures
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Case holder id does not resolve; no target can ever be computed
    #[error("case holder not found: {0}")]
    HolderNotFound(CaseHolderId),

    /// Property id does not resolve
    #[error("property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Requirement catalog invalid
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Engine configuration invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Per-artifact failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// Kind tag outside the closed enumeration
    #[error("unknown document kind: '{0}'")]
    UnknownKind(String),

    /// Blank content locator
    #[error("content locator must not be blank")]
    InvalidLocator,

    /// No target could be computed from the context
    #[error("classification failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// Conditional write kept losing after the retry budget
    #[error("storage conflict on {0}")]
    StorageConflict(String),

    /// Other storage failure
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl ItemError {
    /// Whether the caller can fix this by supplying better context
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::StorageConflict(_))
    }
}

impl From<UpsertError> for ItemError {
    fn from(err: UpsertError) -> Self {
        match err {
            UpsertError::StorageConflict { key } => Self::StorageConflict(key.to_string()),
            UpsertError::Store(source) => Self::Storage(source),
        }
    }
}

/// Failures of a single upsert
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpsertError {
    /// Insert lost the race and the retry could not find the winner's row
    #[error("storage conflict persisted after retry on {key}")]
    StorageConflict { key: Box<DocumentKey> },

    /// Storage backend failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Requirement catalog problems
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// TOML did not parse
    #[error("catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Catalog file unreadable
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two entries for the same role and identity kind
    #[error("duplicate checklist for role {role} and identity {identity}")]
    DuplicateEntry { role: String, identity: String },

    /// A kind listed where the resolver can never attach it
    #[error("{kind} cannot be required on a {scope} checklist")]
    MisplacedKind {
        kind: DocumentKind,
        scope: &'static str,
    },
}

/// Engine configuration problems
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML did not parse
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file unreadable
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
