//! Per-request search and caching options.

use serde::{Deserialize, Serialize};

/// Default recursion limit for bounded directory scans.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// How strategies are allowed to search the installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfiguration {
    /// Maximum directory depth for recursive scans (must be at least 1).
    pub max_depth: usize,
    /// Extra directories to search, relative to the installation root or absolute.
    pub search_directories: Vec<String>,
    /// Glob-style patterns (`*`, `?`) for entries to skip while scanning.
    pub exclude_patterns: Vec<String>,
    /// Only accept candidates that exist on disk.
    pub validate_exists: bool,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
}

impl Default for PathConfiguration {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            search_directories: Vec::new(),
            exclude_patterns: vec![".git".to_string(), "node_modules".to_string()],
            validate_exists: true,
            follow_symlinks: false,
        }
    }
}

/// Caching preferences for a single request.
///
/// Not part of the cache key: the same lookup with different cache options
/// addresses the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Whether this request may be served from or stored in the cache.
    pub enabled: bool,
    /// Whether the in-process memory layer should be consulted.
    pub use_memory_layer: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            use_memory_layer: true,
        }
    }
}

impl CacheOptions {
    /// Options that bypass the cache entirely.
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            use_memory_layer: false,
        }
    }
}
