//! Resolver settings and validation.
//!
//! Settings are constructed explicitly by the caller and passed down to the
//! engine and the cache adapters. Nothing in the workspace reads them from a
//! global.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of entries held by the memory cache layer.
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

/// Default time-to-live of a cache entry, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default cache-hit ratio at which a stored response earns a doubled TTL.
pub const DEFAULT_WARM_TTL_THRESHOLD: f64 = 0.8;

/// Default `max_depth` above which the validator warns.
pub const DEFAULT_MAX_DEPTH_WARNING: usize = 50;

/// Engine and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maximum entries in the memory layer (1-1,000,000).
    pub memory_capacity: usize,

    /// TTL applied to new cache entries, in seconds.
    pub default_ttl_secs: u64,

    /// Responses whose `cache_hit_ratio` reaches this value are stored with
    /// twice the default TTL.
    pub warm_ttl_threshold: f64,

    /// Maximum number of alternative paths reported per response.
    pub max_alternatives: usize,

    /// Maximum candidates the depth scan produces.
    pub depth_scan_limit: usize,

    /// `max_depth` values above this produce a performance warning.
    pub max_depth_warning: usize,

    /// Directory for the persistent cache layer, if one is used.
    pub persistent_cache_dir: Option<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ResolverSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            default_ttl_secs: DEFAULT_TTL_SECS,
            warm_ttl_threshold: DEFAULT_WARM_TTL_THRESHOLD,
            max_alternatives: 10,
            depth_scan_limit: 50,
            max_depth_warning: DEFAULT_MAX_DEPTH_WARNING,
            persistent_cache_dir: None,
        }
    }

    /// Default TTL as a [`Duration`].
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Memory capacity must be between 1 and 1,000,000, got {0}")]
    InvalidCapacity(usize),

    #[error("Default TTL must be at least 1 second")]
    ZeroTtl,

    #[error("Warm TTL threshold must be between 0.0 and 1.0, got {0}")]
    InvalidWarmThreshold(f64),

    #[error("Max alternatives must be at least 1")]
    ZeroAlternatives,

    #[error("Depth scan limit must be at least 1")]
    ZeroScanLimit,

    #[error("Persistent cache directory cannot be empty")]
    EmptyCacheDir,
}

/// Validate settings values.
pub fn validate_settings(settings: &ResolverSettings) -> Result<(), SettingsError> {
    if !(1..=1_000_000).contains(&settings.memory_capacity) {
        return Err(SettingsError::InvalidCapacity(settings.memory_capacity));
    }

    if settings.default_ttl_secs == 0 {
        return Err(SettingsError::ZeroTtl);
    }

    // NaN fails the range check too.
    if !(0.0..=1.0).contains(&settings.warm_ttl_threshold) {
        return Err(SettingsError::InvalidWarmThreshold(
            settings.warm_ttl_threshold,
        ));
    }

    if settings.max_alternatives == 0 {
        return Err(SettingsError::ZeroAlternatives);
    }

    if settings.depth_scan_limit == 0 {
        return Err(SettingsError::ZeroScanLimit);
    }

    if settings
        .persistent_cache_dir
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyCacheDir);
    }

    Ok(())
}
