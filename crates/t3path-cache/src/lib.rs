//! Cache adapters for the `t3path-core` [`PathCache`](t3path_core::PathCache) port.
//!
//! - [`MemoryCache`]: bounded in-process LRU with TTL and filesystem checks
//! - [`JsonFileLayer`]: one JSON document per entry in a directory
//! - [`LayeredCache`]: memory in front of any [`PersistentLayer`]
#![deny(unused_crate_dependencies)]

pub mod entry;
pub mod layered;
pub mod memory;
pub mod persistent;

pub use entry::{CacheEntry, effective_ttl};
pub use layered::LayeredCache;
pub use memory::{MemoryCache, MemoryCacheConfig};
pub use persistent::{CacheError, JsonFileLayer, PersistentLayer};

// Only the integration tests install a subscriber.
#[cfg(test)]
use tracing_subscriber as _;
