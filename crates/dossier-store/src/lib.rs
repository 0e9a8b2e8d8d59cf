//! Dossier Storage Contract
//!
//! What the attachment engine needs from persistence, and a reference
//! in-memory backend.
//!
//! # Overview
//!
//! - [`DocumentStore`]: document rows with a conditional insert on the full identity key
//! - [`CaseRepository`]: case graph reads plus derived-status writes
//! - [`MemoryStore`]: thread-safe in-memory implementation of both
//! - [`LockRegistry`]: keyed mutexes for scoped serialization
//!
//! # Example
//!
//! ```rust
//! use dossier_model::{ArtifactMetadata, CaseHolder, ContentLocator, Document, DocumentKey, DocumentKind, HolderRole, IdentityKind, TargetRef};
//! use dossier_store::{DocumentStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let holder = store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant));
//! let key = DocumentKey::new(
//!     ContentLocator::new("blob://booklet").unwrap(),
//!     DocumentKind::FamilyBooklet,
//!     TargetRef::CaseHolder(holder),
//! );
//!
//! store.insert_unique(Document::new(key.clone(), ArtifactMetadata::default())).unwrap();
//! assert!(store.insert_unique(Document::new(key, ArtifactMetadata::default())).is_err());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod locks;
pub mod memory;
pub mod traits;

// Re-exports
pub use error::StoreError;
pub use locks::LockRegistry;
pub use memory::MemoryStore;
pub use traits::{CaseRepository, DocumentStore, DossierStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
