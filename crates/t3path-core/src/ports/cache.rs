//! Resolution cache port.
//!
//! The engine talks to its cache only through [`PathCache`]. The contract is
//! infallible: an adapter that cannot reach its backing store reports a miss
//! and logs the failure.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{InstallationType, ParseError, PathResolutionRequest, PathResolutionResponse, PathType};

/// Resolution cache used by the engine.
///
/// Implementations must provide mutual exclusion across read, insert and
/// evict so concurrent callers cannot lose LRU bookkeeping.
pub trait PathCache: Send + Sync {
    /// Fresh, filesystem-consistent response for `request`, if any.
    ///
    /// Returns `None` without touching counters when `should_cache` is false.
    fn get(&self, request: &PathResolutionRequest) -> Option<PathResolutionResponse>;

    /// Store `response` under the request's cache key. No-op when
    /// `should_cache` is false.
    fn put(&self, request: &PathResolutionRequest, response: &PathResolutionResponse);

    /// Remove every entry whose key matches all supplied criteria.
    ///
    /// Returns the number of removed entries. Empty criteria remove nothing.
    fn invalidate(&self, criteria: &InvalidationCriteria) -> usize;

    /// Drop every entry. Counters are kept.
    fn clear(&self);

    fn stats(&self) -> CacheStats;

    /// Whether `request` may be served from or stored in this cache.
    fn should_cache(&self, request: &PathResolutionRequest) -> bool {
        should_cache(request)
    }

    /// Whether a stored entry for `request` is unexpired and still agrees with
    /// the filesystem. Does not count as a hit or miss.
    fn is_valid(&self, request: &PathResolutionRequest) -> bool;
}

/// Default caching policy.
///
/// Requests are not cached when the caller disabled caching, when custom
/// validation rules are attached, or when the installation type was
/// auto-detected (the detector may answer differently next time).
pub fn should_cache(request: &PathResolutionRequest) -> bool {
    request.cache_options().enabled
        && request.validation_rules().is_empty()
        && request.installation_type() != InstallationType::AutoDetect
}

/// Criteria for best-effort, key-based invalidation.
///
/// Each supplied criterion is compared against the matching `field=value`
/// segment of the cache key. Enum fields must match exactly. The installation
/// path matches itself and installations below it, but not a sibling that
/// merely shares a name prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidationCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_type: Option<PathType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_type: Option<InstallationType>,
}

impl InvalidationCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path_type(mut self, path_type: PathType) -> Self {
        self.path_type = Some(path_type);
        self
    }

    #[must_use]
    pub fn installation_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.installation_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn installation_type(mut self, installation_type: InstallationType) -> Self {
        self.installation_type = Some(installation_type);
        self
    }

    /// Parse `field → value` pairs as supplied by collaborators.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ParseError> {
        let mut criteria = Self::new();
        for (field, value) in pairs {
            match field {
                "path_type" => criteria.path_type = Some(value.parse()?),
                "installation_type" => criteria.installation_type = Some(value.parse()?),
                "installation_path" => criteria.installation_path = Some(PathBuf::from(value)),
                other => return Err(ParseError::UnknownCriterion(other.to_string())),
            }
        }
        Ok(criteria)
    }

    pub const fn is_empty(&self) -> bool {
        self.path_type.is_none()
            && self.installation_path.is_none()
            && self.installation_type.is_none()
    }

    /// True when every supplied criterion matches `key`. Never true for
    /// empty criteria.
    ///
    /// Fields are read at their first occurrence. `path_type`,
    /// `installation_type` and `installation_path` precede every
    /// caller-controlled value in the key, so an extension key cannot
    /// impersonate them.
    pub fn matches(&self, key: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        let path_type_matches = self
            .path_type
            .is_none_or(|path_type| key_field(key, "path_type") == Some(path_type.as_str()));
        let installation_type_matches = self.installation_type.is_none_or(|installation_type| {
            key_field(key, "installation_type") == Some(installation_type.as_str())
        });
        let path_matches = self
            .installation_path
            .as_deref()
            .is_none_or(|path| installation_path_matches(key, path));

        path_type_matches && installation_type_matches && path_matches
    }
}

/// Everything after the first `;{name}=` in `key`.
fn key_tail<'a>(key: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!(";{name}=");
    key.find(&marker).map(|at| &key[at + marker.len()..])
}

/// Value of the first `;{name}=` segment in `key`.
fn key_field<'a>(key: &'a str, name: &str) -> Option<&'a str> {
    key_tail(key, name).map(|tail| tail.split_once(';').map_or(tail, |(value, _)| value))
}

fn installation_path_matches(key: &str, path: &Path) -> bool {
    let Some(tail) = key_tail(key, "installation_path") else {
        return false;
    };
    let wanted = path.to_string_lossy();
    let wanted = wanted.trim_end_matches(['/', MAIN_SEPARATOR]);
    tail.strip_prefix(wanted)
        .is_some_and(|rest| rest.starts_with([';', '/', MAIN_SEPARATOR]))
}

/// Cache counters. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by `invalidate`.
    pub invalidations: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Entries removed because their TTL elapsed or the filesystem changed.
    pub expirations: u64,
    /// Entries currently stored, across every layer the adapter owns.
    pub entry_count: usize,
    /// Approximate bytes held by cached responses.
    pub memory_bytes: usize,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or 0.0 before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl PathCache for NoopCache {
    fn get(&self, _request: &PathResolutionRequest) -> Option<PathResolutionResponse> {
        None
    }

    fn put(&self, _request: &PathResolutionRequest, _response: &PathResolutionResponse) {}

    fn invalidate(&self, _criteria: &InvalidationCriteria) -> usize {
        0
    }

    fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn should_cache(&self, _request: &PathResolutionRequest) -> bool {
        false
    }

    fn is_valid(&self, _request: &PathResolutionRequest) -> bool {
        false
    }
}
