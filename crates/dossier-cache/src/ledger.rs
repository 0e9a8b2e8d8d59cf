//! Submission ledger
//!
//! Public intake links resubmit the same batch. The ledger remembers a
//! content fingerprint of each batch so replays can be observed; it never
//! decides outcomes, which stay idempotent on their own.

use crate::policy::{CachePolicy, CacheStats};
use moka::sync::Cache;
use std::fmt;

/// Blake3 digest identifying a submission's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    /// Start a fingerprint
    #[inline]
    #[must_use]
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder {
            hasher: blake3::Hasher::new(),
        }
    }

    /// Hex encoding
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// First 16 hex characters, for logs
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(16);
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Incremental fingerprint construction
///
/// Every field is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    hasher: blake3::Hasher,
}

impl FingerprintBuilder {
    /// Mix in a text field
    #[must_use]
    pub fn field(mut self, value: &str) -> Self {
        self.hasher.update(&(value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
        self
    }

    /// Mix in an optional text field
    #[must_use]
    pub fn optional(mut self, value: Option<&str>) -> Self {
        match value {
            Some(value) => {
                self.hasher.update(&[1]);
                self.field(value)
            }
            None => {
                self.hasher.update(&[0]);
                self
            }
        }
    }

    /// Finish
    #[must_use]
    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize())
    }
}

/// Fingerprint to number of sightings
#[derive(Debug, Clone)]
pub struct SubmissionLedger {
    inner: Cache<Fingerprint, u32>,
}

impl SubmissionLedger {
    /// Create ledger with the given policy
    #[inline]
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: policy.build(),
        }
    }

    /// Record a sighting; returns how many times it was seen before
    pub fn record(&self, fingerprint: Fingerprint) -> u32 {
        let entry = self
            .inner
            .entry(fingerprint)
            .and_upsert_with(|existing| existing.map_or(1, |e| e.into_value().saturating_add(1)));
        let prior = entry.into_value().saturating_sub(1);
        if prior > 0 {
            tracing::info!(fingerprint = %fingerprint.short(), prior, "submission replayed");
        }
        prior
    }

    /// Sightings so far
    #[inline]
    #[must_use]
    pub fn seen(&self, fingerprint: &Fingerprint) -> u32 {
        self.inner.get(fingerprint).unwrap_or(0)
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for SubmissionLedger {
    fn default() -> Self {
        Self::new(CachePolicy::new(50_000, 3_600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_sighting_reports_zero() {
        let ledger = SubmissionLedger::default();
        let fp = Fingerprint::builder().field("batch").finish();
        assert_eq!(ledger.record(fp), 0);
        assert_eq!(ledger.seen(&fp), 1);
    }

    #[test]
    fn replays_are_counted() {
        let ledger = SubmissionLedger::default();
        let fp = Fingerprint::builder().field("batch").finish();
        ledger.record(fp);
        assert_eq!(ledger.record(fp), 1);
        assert_eq!(ledger.record(fp), 2);
        assert_eq!(ledger.stats().entry_count, 1);
    }

    #[test]
    fn field_boundaries_matter() {
        let a = Fingerprint::builder().field("ab").field("c").finish();
        let b = Fingerprint::builder().field("a").field("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn absent_optional_differs_from_empty() {
        let a = Fingerprint::builder().optional(None).finish();
        let b = Fingerprint::builder().optional(Some("")).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn short_is_prefix() {
        let fp = Fingerprint::builder().field("x").finish();
        assert_eq!(fp.short().len(), 16);
        assert!(fp.to_hex().starts_with(&fp.short()));
    }

    proptest! {
        #[test]
        fn prop_fingerprint_is_deterministic(fields in proptest::collection::vec(".*", 0..8)) {
            let build = || fields
                .iter()
                .fold(Fingerprint::builder(), |b, f| b.field(f))
                .finish();
            prop_assert_eq!(build(), build());
        }
    }
}
