//! Port definitions (trait abstractions) for infrastructure.
//!
//! Ports use only domain types. Adapters live in their own crates.

pub mod cache;

pub use cache::{CacheStats, InvalidationCriteria, NoopCache, PathCache, should_cache};
