//! Memory layer in front of a persistent layer.
//!
//! Lookups try memory first (when the request asks for it), then the
//! persistent layer, promoting persistent hits into memory. Stores write
//! through to both. Persistent-layer failures are logged and treated as
//! misses.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use t3path_core::{
    CacheStats, InvalidationCriteria, PathCache, PathResolutionRequest, PathResolutionResponse,
    ResolutionStatus, ResolverSettings, should_cache,
};

use crate::entry::{CacheEntry, effective_ttl};
use crate::memory::{MemoryCache, MemoryCacheConfig};
use crate::persistent::{CacheError, JsonFileLayer, PersistentLayer};

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    invalidations: u64,
    expirations: u64,
}

/// Two-level cache: bounded memory LRU plus a durable store.
pub struct LayeredCache {
    memory: MemoryCache,
    persistent: Box<dyn PersistentLayer>,
    counters: Mutex<Counters>,
}

impl LayeredCache {
    pub fn new(memory: MemoryCache, persistent: Box<dyn PersistentLayer>) -> Self {
        Self {
            memory,
            persistent,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Build from settings. Without `persistent_cache_dir` there is nothing to
    /// layer and `Ok(None)` is returned.
    pub fn from_settings(settings: &ResolverSettings) -> Result<Option<Self>, CacheError> {
        let Some(dir) = settings.persistent_cache_dir.as_deref() else {
            return Ok(None);
        };
        let layer = JsonFileLayer::new(dir)?;
        Ok(Some(Self::new(
            MemoryCache::new(MemoryCacheConfig::from_settings(settings)),
            Box::new(layer),
        )))
    }

    pub const fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh persistent entry for `key`; stale ones are deleted.
    fn load_fresh(&self, key: &str) -> Option<CacheEntry> {
        let entry = match self.persistent.load(key) {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(error = %e, "persistent cache read failed");
                return None;
            }
        };
        if entry.is_fresh() {
            return Some(entry);
        }
        self.counters().expirations += 1;
        if let Err(e) = self.persistent.remove(key) {
            warn!(error = %e, "failed to drop stale persistent entry");
        }
        None
    }
}

impl PathCache for LayeredCache {
    fn get(&self, request: &PathResolutionRequest) -> Option<PathResolutionResponse> {
        if !self.should_cache(request) {
            return None;
        }

        if let Some(response) = self.memory.get(request) {
            self.counters().hits += 1;
            return Some(response);
        }

        let key = request.cache_key();
        let Some(entry) = self.load_fresh(&key) else {
            self.counters().misses += 1;
            return None;
        };

        debug!(cache_key = %key, "persistent cache hit");
        self.counters().hits += 1;
        let response = entry.response.clone();
        if self.memory.should_cache(request) {
            self.memory.insert_entry(key, entry);
        }
        Some(response)
    }

    fn put(&self, request: &PathResolutionRequest, response: &PathResolutionResponse) {
        if !self.should_cache(request) || response.status == ResolutionStatus::Error {
            return;
        }
        self.memory.put(request, response);

        let config = self.memory.config();
        let ttl = effective_ttl(response, config.default_ttl, config.warm_ttl_threshold);
        let entry = CacheEntry::new(response.clone(), ttl);
        if let Err(e) = self.persistent.store(&request.cache_key(), &entry) {
            warn!(error = %e, "persistent cache write failed");
        }
    }

    fn invalidate(&self, criteria: &InvalidationCriteria) -> usize {
        if criteria.is_empty() {
            return 0;
        }
        let mut removed: BTreeSet<String> = self.memory.remove_matching(criteria).into_iter().collect();

        match self.persistent.keys() {
            Ok(keys) => {
                for key in keys.into_iter().filter(|k| criteria.matches(k)) {
                    match self.persistent.remove(&key) {
                        Ok(_) => {
                            removed.insert(key);
                        }
                        Err(e) => warn!(error = %e, "failed to invalidate persistent entry"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "persistent cache listing failed"),
        }

        self.counters().invalidations += removed.len() as u64;
        info!(removed = removed.len(), "invalidated cache entries");
        removed.len()
    }

    fn clear(&self) {
        self.memory.clear();
        if let Err(e) = self.persistent.clear() {
            warn!(error = %e, "persistent cache clear failed");
        }
    }

    /// `entry_count` covers the persistent layer too, since it keeps serving
    /// entries that are no longer (or not yet) in memory.
    fn stats(&self) -> CacheStats {
        let memory = self.memory.stats();
        let persistent_count = match self.persistent.count() {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "persistent cache listing failed");
                0
            }
        };
        let counters = self.counters();
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            invalidations: counters.invalidations,
            evictions: memory.evictions,
            expirations: counters.expirations + memory.expirations,
            entry_count: memory.entry_count.max(persistent_count),
            memory_bytes: memory.memory_bytes,
        }
    }

    fn should_cache(&self, request: &PathResolutionRequest) -> bool {
        should_cache(request)
    }

    fn is_valid(&self, request: &PathResolutionRequest) -> bool {
        if !self.should_cache(request) {
            return false;
        }
        if self.memory.is_valid(request) {
            return true;
        }
        match self.persistent.load(&request.cache_key()) {
            Ok(entry) => entry.is_some_and(|e| e.is_fresh()),
            Err(e) => {
                warn!(error = %e, "persistent cache read failed");
                false
            }
        }
    }
}
