//! Bounded in-process cache with LRU eviction and TTL.
//!
//! Entries live in a `HashMap` arena keyed by cache key. A `BTreeMap` keyed by
//! a monotonic access tick is the recency index: its first element is always
//! the least recently used entry. Ticks never repeat, so among entries that
//! were never re-accessed the one inserted first is evicted first.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};
use t3path_core::{
    CacheStats, InvalidationCriteria, PathCache, PathResolutionRequest, PathResolutionResponse,
    ResolutionStatus, ResolverSettings, should_cache,
};

use crate::entry::{CacheEntry, effective_ttl};

/// Memory cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries (default: 1000)
    pub capacity: usize,
    /// TTL for new entries (default: 1 hour)
    pub default_ttl: Duration,
    /// Hit ratio at which new entries get a doubled TTL (default: 0.8)
    pub warm_ttl_threshold: f64,
}

impl MemoryCacheConfig {
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self {
            capacity: settings.memory_capacity.max(1),
            default_ttl: settings.default_ttl(),
            warm_ttl_threshold: settings.warm_ttl_threshold,
        }
    }
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self::from_settings(&ResolverSettings::with_defaults())
    }
}

struct Slot {
    entry: CacheEntry,
    tick: u64,
    size: usize,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    memory_bytes: usize,
    stats: CacheStats,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        let size = entry.response.approximate_size() + key.len();
        let tick = self.tick();
        self.recency.insert(tick, key.clone());
        self.memory_bytes += size;
        if let Some(old) = self.slots.insert(key, Slot { entry, tick, size }) {
            self.recency.remove(&old.tick);
            self.memory_bytes -= old.size;
        }
    }

    fn remove(&mut self, key: &str) -> Option<Slot> {
        let slot = self.slots.remove(key)?;
        self.recency.remove(&slot.tick);
        self.memory_bytes -= slot.size;
        Some(slot)
    }

    /// Move `key` to the most-recent end of the recency index.
    fn promote(&mut self, key: &str) {
        let tick = self.tick();
        if let Some(slot) = self.slots.get_mut(key) {
            self.recency.remove(&slot.tick);
            slot.tick = tick;
            slot.entry.touch();
            self.recency.insert(tick, key.to_string());
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        if let Some(slot) = self.slots.remove(&key) {
            self.memory_bytes -= slot.size;
        }
        self.stats.evictions += 1;
        Some(key)
    }
}

/// In-process LRU cache of resolution responses.
pub struct MemoryCache {
    config: MemoryCacheConfig,
    inner: Mutex<Inner>,
}

impl MemoryCache {
    pub fn new(config: MemoryCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self::new(MemoryCacheConfig::from_settings(settings))
    }

    pub const fn config(&self) -> &MemoryCacheConfig {
        &self.config
    }

    /// Every mutation leaves arena and recency index in step, so a poisoned
    /// lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a prepared entry, keeping its timestamp and TTL.
    pub(crate) fn insert_entry(&self, key: String, entry: CacheEntry) {
        let mut inner = self.lock();
        if !inner.slots.contains_key(&key) && inner.slots.len() >= self.config.capacity {
            if let Some(evicted) = inner.evict_lru() {
                info!(key = %evicted, "evicted least recently used entry");
            }
        }
        inner.insert(key, entry);
    }

    /// Remove entries matching `criteria` and return their keys.
    pub fn remove_matching(&self, criteria: &InvalidationCriteria) -> Vec<String> {
        if criteria.is_empty() {
            return Vec::new();
        }
        let mut inner = self.lock();
        let keys: Vec<String> = inner
            .slots
            .keys()
            .filter(|key| criteria.matches(key))
            .cloned()
            .collect();
        for key in &keys {
            inner.remove(key);
        }
        inner.stats.invalidations += keys.len() as u64;
        if !keys.is_empty() {
            info!(removed = keys.len(), "invalidated memory cache entries");
        }
        keys
    }

    /// Keys in eviction order, least recently used first.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lock().recency.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(MemoryCacheConfig::default())
    }
}

impl PathCache for MemoryCache {
    fn get(&self, request: &PathResolutionRequest) -> Option<PathResolutionResponse> {
        if !self.should_cache(request) {
            return None;
        }
        let key = request.cache_key();
        let mut inner = self.lock();

        let fresh = inner.slots.get(&key).map(|slot| slot.entry.is_fresh());
        match fresh {
            Some(true) => {
                inner.promote(&key);
                inner.stats.hits += 1;
                debug!(cache_key = %key, "memory cache hit");
                inner.slots.get(&key).map(|slot| slot.entry.response.clone())
            }
            Some(false) => {
                inner.remove(&key);
                inner.stats.expirations += 1;
                inner.stats.misses += 1;
                debug!(cache_key = %key, "memory cache entry expired");
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    fn put(&self, request: &PathResolutionRequest, response: &PathResolutionResponse) {
        if !self.should_cache(request) || response.status == ResolutionStatus::Error {
            return;
        }
        let ttl = effective_ttl(response, self.config.default_ttl, self.config.warm_ttl_threshold);
        self.insert_entry(request.cache_key(), CacheEntry::new(response.clone(), ttl));
    }

    fn invalidate(&self, criteria: &InvalidationCriteria) -> usize {
        self.remove_matching(criteria).len()
    }

    fn clear(&self) {
        let mut inner = self.lock();
        inner.slots.clear();
        inner.recency.clear();
        inner.memory_bytes = 0;
    }

    fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entry_count: inner.slots.len(),
            memory_bytes: inner.memory_bytes,
            ..inner.stats
        }
    }

    /// The default policy, and only when the request asks for the memory layer.
    fn should_cache(&self, request: &PathResolutionRequest) -> bool {
        should_cache(request) && request.cache_options().use_memory_layer
    }

    fn is_valid(&self, request: &PathResolutionRequest) -> bool {
        self.should_cache(request)
            && self
                .lock()
                .slots
                .get(&request.cache_key())
                .is_some_and(|slot| slot.entry.is_fresh())
    }
}
