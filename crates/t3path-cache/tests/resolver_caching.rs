//! The resolver wired to real cache adapters.

mod common;

use std::sync::Arc;

use t3path_core::{
    InstallationType, InvalidationCriteria, PathResolutionRequest, PathResolver, PathType,
    ResolutionStatus, ResolverSettings,
};
use t3path_cache::{JsonFileLayer, LayeredCache, MemoryCache, PersistentLayer};
use tempfile::tempdir;

use common::{init_tracing, legacy_site};

fn extension(root: &std::path::Path, key: &str) -> PathResolutionRequest {
    PathResolutionRequest::builder()
        .path_type(PathType::Extension)
        .installation_path(root)
        .installation_type(InstallationType::LegacySource)
        .extension_key(key)
        .build()
        .unwrap()
}

fn memory_resolver() -> PathResolver {
    init_tracing();
    let settings = ResolverSettings::with_defaults();
    PathResolver::new(Arc::new(MemoryCache::from_settings(&settings)), &settings).unwrap()
}

#[test]
fn second_resolution_is_served_from_cache() {
    let site = legacy_site(&["news"]);
    let request = extension(site.path(), "news");
    let resolver = memory_resolver();

    let first = resolver.resolve(&request);
    let second = resolver.resolve(&request);

    assert_eq!(first.status, ResolutionStatus::Success);
    assert!(!first.metadata.was_from_cache);
    assert!(second.metadata.was_from_cache);
    assert_eq!(second.resolved_path, first.resolved_path);
    assert_eq!(resolver.cache_stats().hits, 1);
}

#[test]
fn not_found_outcomes_are_cached_too() {
    let site = legacy_site(&[]);
    let request = extension(site.path(), "missing");
    let resolver = memory_resolver();

    let first = resolver.resolve(&request);
    let second = resolver.resolve(&request);

    assert_eq!(first.status, ResolutionStatus::NotFound);
    assert_eq!(second.status, ResolutionStatus::NotFound);
    assert!(second.metadata.was_from_cache);
}

#[test]
fn invalidation_forces_fresh_resolution() {
    let site = legacy_site(&["news"]);
    let request = extension(site.path(), "news");
    let resolver = memory_resolver();

    resolver.resolve(&request);
    let removed = resolver.invalidate(
        &InvalidationCriteria::new().installation_path(request.installation_path()),
    );
    let again = resolver.resolve(&request);

    assert_eq!(removed, 1);
    assert!(!again.metadata.was_from_cache);
}

#[test]
fn layered_cache_survives_a_restart() {
    init_tracing();
    let site = legacy_site(&["news"]);
    let store = tempdir().unwrap();
    let request = extension(site.path(), "news");

    let open = || {
        let settings = ResolverSettings {
            persistent_cache_dir: Some(store.path().to_string_lossy().into_owned()),
            ..ResolverSettings::with_defaults()
        };
        let cache = LayeredCache::from_settings(&settings).unwrap().unwrap();
        PathResolver::new(Arc::new(cache), &settings).unwrap()
    };

    let first = open().resolve(&request);
    assert!(!first.metadata.was_from_cache);

    let restarted = open().resolve(&request);
    assert!(restarted.metadata.was_from_cache);
    assert_eq!(restarted.resolved_path, first.resolved_path);

    let layer = JsonFileLayer::new(store.path()).unwrap();
    assert_eq!(layer.keys().unwrap(), vec![request.cache_key()]);
}
