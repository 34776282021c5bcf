//! Cache entries and their freshness rules.

use std::fs;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use t3path_core::{PathResolutionResponse, ResolutionStatus};

/// A stored response plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: PathResolutionResponse,
    /// When the entry was stored.
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
    pub access_count: u64,
    pub last_access_time: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(response: PathResolutionResponse, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            response,
            timestamp: now,
            ttl,
            access_count: 0,
            last_access_time: now,
        }
    }

    /// Whether the TTL has elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.timestamp) >= ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the filesystem still agrees with a SUCCESS response.
    ///
    /// The resolved path must still exist and must not have been modified
    /// after the entry was stored. Other statuses are not checked.
    pub fn matches_filesystem(&self) -> bool {
        if self.response.status != ResolutionStatus::Success {
            return true;
        }
        let Some(path) = &self.response.resolved_path else {
            return false;
        };
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        // Platforms without mtime support fall back to TTL only.
        match metadata.modified() {
            Ok(mtime) => DateTime::<Utc>::from(mtime) <= self.timestamp,
            Err(_) => true,
        }
    }

    /// Unexpired and consistent with the filesystem.
    pub fn is_fresh(&self) -> bool {
        !self.is_expired() && self.matches_filesystem()
    }

    /// Record an access.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access_time = Utc::now();
    }
}

/// TTL for a new entry.
///
/// Responses produced while the cache was already serving at least
/// `warm_threshold` of lookups get twice the default.
pub fn effective_ttl(
    response: &PathResolutionResponse,
    default_ttl: Duration,
    warm_threshold: f64,
) -> Duration {
    if response.metadata.cache_hit_ratio >= warm_threshold {
        default_ttl.saturating_mul(2)
    } else {
        default_ttl
    }
}
