//! Dossier Case Graph Model
//!
//! Entity shapes and relationships the attachment engine reasons over.
//!
//! # Core Concepts
//!
//! - [`CaseHolder`]: root of a case file (individual or organization; owner, tenant or lead)
//! - [`Individual`], [`Organization`], [`Property`], [`Lease`]: the other owners a document may have
//! - [`TargetRef`]: exactly-one-of-five document ownership as a sum type
//! - [`DocumentKind`]: the closed set of artifact kinds
//! - [`CompletionStatus`]: derived readiness of a holder or property
//!
//! # Example
//!
//! ```rust
//! use dossier_model::{CaseHolder, HolderRole, IdentityKind, TargetRef};
//!
//! let holder = CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant);
//! let target = TargetRef::CaseHolder(holder.id);
//! assert_eq!(target.to_columns().populated(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod context;
mod document;
mod entities;
mod error;
mod ids;
mod kind;
mod status;
mod target;

// Re-exports
pub use context::{order_individuals, CaseContext, HolderGraph, PropertyLink};
pub use document::{ArtifactMetadata, ContentLocator, Document, DocumentKey};
pub use entities::{
    field_present, CaseHolder, FieldMap, HolderRole, IdentityKind, Individual, Lease, LeaseParty,
    LeaseSide, Organization, Property,
};
pub use error::ModelError;
pub use ids::{
    CaseHolderId, DocumentId, IndividualId, LeaseId, OrganizationId, PropertyId, UploaderId,
};
pub use kind::DocumentKind;
pub use status::{CompletionStatus, StatusSubject};
pub use target::{OwnerColumns, TargetRef};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
