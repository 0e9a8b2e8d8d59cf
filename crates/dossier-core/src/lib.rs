//! Dossier Core - Attachment Engine
//!
//! The write path for case-file artifacts:
//! - Classifies each artifact onto exactly one owner
//! - Upserts idempotently on (content locator, kind, owner)
//! - Applies submissions item by item with per-item outcomes
//! - Recomputes holder and property completion after each batch
//!
//! # Example
//!
//! ```rust
//! use dossier_core::prelude::*;
//! use dossier_model::{CaseHolder, HolderRole, IdentityKind, Individual};
//! use dossier_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let holder = store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant));
//! store.insert_individual(Individual::new(holder, true)).unwrap();
//!
//! let engine = DossierEngine::new(store, RequirementCatalog::new());
//! let report = engine
//!     .apply_batch(
//!         &ContextRefs::holder(holder),
//!         &[BatchItem::new("identity_document", "blob://passport")],
//!     )
//!     .unwrap();
//! assert_eq!(report.created(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod aggregate;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod upsert;

// Re-exports for convenience
pub use aggregate::{CompletionAggregator, StatusUpdate};
pub use batch::{BatchItem, BatchReport, ContextRefs, ItemOutcome, ItemStatus, Submission};
pub use catalog::{HolderChecklist, PropertyChecklist, Requirement, RequirementCatalog};
pub use config::{CacheConfig, EngineConfig};
pub use engine::{DossierEngine, EngineCacheStats};
pub use error::{CatalogError, ConfigError, EngineError, EngineResult, ItemError, UpsertError};
pub use upsert::{UpsertAction, UpsertEngine, UpsertOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the attachment engine
    pub use crate::{
        BatchItem, BatchReport, ContextRefs, DossierEngine, EngineConfig, EngineError, ItemStatus,
        RequirementCatalog, StatusUpdate, UpsertAction,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
