//! Behavior of the memory cache through the `PathCache` port.

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use t3path_core::{
    CacheOptions, InstallationType, InvalidationCriteria, PathCache, PathResolutionRequest,
    PathType, ResolutionStatus,
};
use t3path_cache::{MemoryCache, MemoryCacheConfig};

use common::{init_tracing, legacy_site, not_found, request, request_for, response};

fn cache(config: MemoryCacheConfig) -> MemoryCache {
    init_tracing();
    MemoryCache::new(config)
}

#[test]
fn stored_response_is_returned_until_ttl_elapses() {
    let site = legacy_site(&[]);
    let cache = cache(MemoryCacheConfig {
        default_ttl: Duration::from_millis(50),
        ..MemoryCacheConfig::default()
    });
    let web = request(site.path(), PathType::WebDir);
    let stored = not_found(&web);

    cache.put(&web, &stored);
    assert_eq!(cache.get(&web), Some(stored));

    thread::sleep(Duration::from_millis(120));
    assert!(cache.get(&web).is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.entry_count, 0);
}

#[test]
fn capacity_of_one_keeps_only_the_latest_entry() {
    let site = legacy_site(&[]);
    let cache = cache(MemoryCacheConfig {
        capacity: 1,
        ..MemoryCacheConfig::default()
    });
    let web = request(site.path(), PathType::WebDir);
    let config = request(site.path(), PathType::ConfigFile);

    cache.put(&web, &not_found(&web));
    cache.put(&config, &not_found(&config));

    assert!(cache.get(&web).is_none());
    assert!(cache.get(&config).is_some());
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn excluded_requests_are_never_stored() {
    let site = legacy_site(&[]);
    let cache = cache(MemoryCacheConfig::default());

    let disabled = PathResolutionRequest::builder()
        .path_type(PathType::WebDir)
        .installation_path(site.path())
        .installation_type(InstallationType::LegacySource)
        .cache_options(CacheOptions::disabled())
        .build()
        .unwrap();
    let with_rules = PathResolutionRequest::builder()
        .path_type(PathType::WebDir)
        .installation_path(site.path())
        .installation_type(InstallationType::LegacySource)
        .validation_rule("min_path_length", json!(3))
        .build()
        .unwrap();
    let detected = PathResolutionRequest::builder()
        .path_type(PathType::WebDir)
        .installation_path(site.path())
        .installation_type(InstallationType::AutoDetect)
        .build()
        .unwrap();

    for request in [&disabled, &with_rules, &detected] {
        assert!(!cache.should_cache(request));
        cache.put(request, &not_found(request));
        assert!(cache.get(request).is_none());
    }

    assert!(cache.is_empty());
    // Lookups that were never cacheable do not count as misses.
    assert_eq!(cache.stats().misses, 0);
}

#[test]
fn deleted_resolved_path_invalidates_entry() {
    let site = legacy_site(&[]);
    let cache = cache(MemoryCacheConfig::default());
    let config_file = site.path().join("typo3conf/LocalConfiguration.php");
    let config = request(site.path(), PathType::ConfigFile);

    cache.put(
        &config,
        &response(&config, ResolutionStatus::Success, Some(&config_file)),
    );
    assert!(cache.is_valid(&config));

    fs::remove_file(&config_file).unwrap();

    assert!(!cache.is_valid(&config));
    assert!(cache.get(&config).is_none());
}

#[test]
fn invalidation_matches_key_fields() {
    let first = legacy_site(&[]);
    let second = legacy_site(&[]);
    let cache = cache(MemoryCacheConfig::default());

    let requests = [
        request(first.path(), PathType::WebDir),
        request(first.path(), PathType::ConfigFile),
        request(second.path(), PathType::WebDir),
    ];
    for request in &requests {
        cache.put(request, &not_found(request));
    }

    assert_eq!(cache.invalidate(&InvalidationCriteria::new()), 0);

    let by_type = InvalidationCriteria::new().path_type(PathType::WebDir);
    assert_eq!(cache.invalidate(&by_type), 2);
    assert!(cache.get(&requests[1]).is_some());

    let by_path = InvalidationCriteria::new().installation_path(requests[1].installation_path());
    assert_eq!(cache.invalidate(&by_path), 1);
    assert!(cache.is_empty());
    assert_eq!(cache.stats().invalidations, 3);
}

const THREADS: usize = 8;
const ROUNDS: usize = 50;

#[test]
fn concurrent_access_keeps_bounds_and_counts() {
    let site = legacy_site(&[]);
    let cache = Arc::new(cache(MemoryCacheConfig {
        capacity: 3,
        ..MemoryCacheConfig::default()
    }));
    let requests: Vec<_> = [
        PathType::WebDir,
        PathType::ConfigFile,
        PathType::VendorDir,
        PathType::ExtensionDir,
        PathType::SystemExtensionDir,
    ]
    .into_iter()
    // Composer layouts accept every path type, vendor_dir included.
    .map(|path_type| request_for(site.path(), path_type, InstallationType::ComposerStandard))
    .collect();

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let cache = Arc::clone(&cache);
            let requests = &requests;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let request = &requests[(worker + round) % requests.len()];
                    cache.put(request, &not_found(request));
                    let _ = cache.get(request);
                }
            });
        }
    });

    let stats = cache.stats();
    assert!(stats.entry_count <= 3);
    assert_eq!(stats.entry_count, cache.keys_by_recency().len());
    assert_eq!(stats.hits + stats.misses, (THREADS * ROUNDS) as u64);
}
