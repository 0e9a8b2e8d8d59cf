//! Stored documents and their identity key

use crate::error::ModelError;
use crate::ids::{DocumentId, UploaderId};
use crate::kind::DocumentKind;
use crate::target::TargetRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the uploaded bytes live; opaque to this engine
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentLocator(String);

impl ContentLocator {
    /// Validate and wrap a locator
    ///
    /// # Errors
    /// [`ModelError::InvalidLocator`] when blank
    pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ModelError::InvalidLocator);
        }
        Ok(Self(raw))
    }

    /// Locator text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentLocator {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentLocator> for String {
    fn from(locator: ContentLocator) -> Self {
        locator.0
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive metadata supplied with each submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub label: String,
    pub media_type: String,
    pub size: u64,
    #[serde(default)]
    pub uploader: Option<UploaderId>,
}

impl ArtifactMetadata {
    /// Metadata with label and media type
    #[must_use]
    pub fn new(label: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            label: label.into(),
            media_type: media_type.into(),
            size,
            uploader: None,
        }
    }

    /// Attach an uploader
    #[must_use]
    pub fn with_uploader(mut self, uploader: UploaderId) -> Self {
        self.uploader = Some(uploader);
        self
    }
}

/// Composite identity of a document row
///
/// Matching on the full [`TargetRef`] means a household-level document never
/// matches a person-level one that shares its locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub locator: ContentLocator,
    pub kind: DocumentKind,
    pub owner: TargetRef,
}

impl DocumentKey {
    /// Build a key
    #[must_use]
    pub fn new(locator: ContentLocator, kind: DocumentKind, owner: TargetRef) -> Self {
        Self { locator, kind, owner }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} -> {}", self.kind, self.locator, self.owner)
    }
}

/// A classified, attached document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub locator: ContentLocator,
    pub owner: TargetRef,
    pub label: String,
    pub media_type: String,
    pub size: u64,
    pub uploader: Option<UploaderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// New document row from a key and metadata
    #[must_use]
    pub fn new(key: DocumentKey, metadata: ArtifactMetadata) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            kind: key.kind,
            locator: key.locator,
            owner: key.owner,
            label: metadata.label,
            media_type: metadata.media_type,
            size: metadata.size,
            uploader: metadata.uploader,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity key of this row
    #[must_use]
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.locator.clone(), self.kind, self.owner)
    }

    /// Overwrite descriptive metadata in place
    ///
    /// The owner never changes; the uploader only when one is supplied.
    pub fn apply_metadata(&mut self, metadata: &ArtifactMetadata) {
        self.label.clone_from(&metadata.label);
        self.media_type.clone_from(&metadata.media_type);
        self.size = metadata.size;
        if let Some(uploader) = metadata.uploader {
            self.uploader = Some(uploader);
        }
        self.updated_at = Utc::now();
    }
}
