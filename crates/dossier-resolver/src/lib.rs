//! Dossier Attachment Resolver
//!
//! Decides which single entity of a case graph owns an uploaded artifact.
//!
//! Rules are evaluated in a fixed precedence order, first match wins:
//!
//! 1. Per-individual kinds: the individual at the party index (clamped to the primary)
//! 2. Organization kinds: the holder's organization
//! 3. Property-only kinds: the supplied property
//! 4. Role-dependent kinds: the property for an OWNER with a property, else the holder
//! 5. Anything else: the holder itself
//!
//! # Example
//!
//! ```rust
//! use dossier_model::{CaseContext, CaseHolder, DocumentKind, HolderGraph, HolderRole, IdentityKind, TargetRef};
//! use dossier_resolver::AttachmentResolver;
//! use std::sync::Arc;
//!
//! let holder = CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant);
//! let id = holder.id;
//! let context = CaseContext::new(Arc::new(HolderGraph::new(holder, vec![], None)));
//!
//! let target = AttachmentResolver::new()
//!     .resolve(DocumentKind::InsuranceCertificate, &context, None)
//!     .unwrap();
//! assert_eq!(target, TargetRef::CaseHolder(id));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod resolver;
mod rules;

pub use resolver::{AttachmentResolver, ResolutionError};
pub use rules::{rule_for, RuleClass, RULE_TABLE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
