//! Dossier Caches
//!
//! Explicit, injected cache abstractions with a defined eviction policy
//! (capacity bound plus time-to-live), built on moka.
//!
//! - [`ContextCache`]: holder id to loaded holder graph
//! - [`StatusCache`]: last computed completion status per holder/property
//! - [`SubmissionLedger`]: replay detection for resubmitted batches

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod context;
pub mod ledger;
pub mod policy;
pub mod status;

// Re-exports for convenience
pub use context::ContextCache;
pub use ledger::{Fingerprint, FingerprintBuilder, SubmissionLedger};
pub use policy::{CachePolicy, CacheStats};
pub use status::StatusCache;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
