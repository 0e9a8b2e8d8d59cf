//! Engine configuration

use crate::error::ConfigError;
use dossier_cache::CachePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on conflict retries; each retry is a full find-then-update
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Attachment engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache eviction policies
    pub cache: CacheConfig,
    /// Times a lost conditional write is retried as an update
    pub conflict_retries: u32,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Parse failure or an out-of-range value.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Unreadable file, parse failure or an out-of-range value.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// The first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, policy) in [
            ("cache.context", self.cache.context),
            ("cache.status", self.cache.status),
            ("cache.ledger", self.cache.ledger),
        ] {
            if policy.capacity == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "capacity must be positive".to_string(),
                });
            }
            if policy.ttl_secs == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "ttl_secs must be positive".to_string(),
                });
            }
        }
        if self.conflict_retries > MAX_CONFLICT_RETRIES {
            return Err(ConfigError::Invalid {
                field: "conflict_retries",
                reason: format!("at most {MAX_CONFLICT_RETRIES}, got {}", self.conflict_retries),
            });
        }
        Ok(())
    }

    /// With cache policies
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With conflict retries
    #[inline]
    #[must_use]
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            conflict_retries: 1,
        }
    }
}

/// One eviction policy per injected cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Holder graphs
    pub context: CachePolicy,
    /// Last computed statuses
    pub status: CachePolicy,
    /// Submission fingerprints
    pub ledger: CachePolicy,
}

impl CacheConfig {
    /// With context cache policy
    #[inline]
    #[must_use]
    pub fn with_context(mut self, policy: CachePolicy) -> Self {
        self.context = policy;
        self
    }

    /// With status cache policy
    #[inline]
    #[must_use]
    pub fn with_status(mut self, policy: CachePolicy) -> Self {
        self.status = policy;
        self
    }

    /// With ledger policy
    #[inline]
    #[must_use]
    pub fn with_ledger(mut self, policy: CachePolicy) -> Self {
        self.ledger = policy;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            context: CachePolicy::new(10_000, 300),
            status: CachePolicy::new(10_000, 300),
            ledger: CachePolicy::new(50_000, 3_600),
        }
    }
}
