//! Path resolver - orchestrates validation, caching and strategy dispatch.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::domain::{
    PathResolutionMetadata, PathResolutionRequest, PathResolutionResponse, ResolutionStatus,
};
use crate::ports::{CacheStats, InvalidationCriteria, PathCache};
use crate::settings::{ResolverSettings, SettingsError, validate_settings};
use crate::strategy::{DispatchOutcome, StrategyDispatcher};
use crate::validation::RequestValidator;

/// Error recorded when every strategy in the chain failed.
pub const ALL_STRATEGIES_FAILED: &str = "all strategies failed";

/// Resolves requests to filesystem paths.
///
/// Flow: validate → cache lookup → strategy dispatch → cache store.
pub struct PathResolver {
    cache: Arc<dyn PathCache>,
    validator: RequestValidator,
    dispatcher: StrategyDispatcher,
}

impl PathResolver {
    /// Create a resolver over `cache`. Settings are validated first.
    pub fn new(cache: Arc<dyn PathCache>, settings: &ResolverSettings) -> Result<Self, SettingsError> {
        validate_settings(settings)?;
        Ok(Self {
            cache,
            validator: RequestValidator::new(settings.max_depth_warning),
            dispatcher: StrategyDispatcher::new(settings.max_alternatives, settings.depth_scan_limit),
        })
    }

    /// Replace the validator, e.g. one with extra custom rules registered.
    #[must_use]
    pub fn with_validator(mut self, validator: RequestValidator) -> Self {
        self.validator = validator;
        self
    }

    pub const fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    /// Resolve a request. Never fails; problems are reported in the response.
    pub fn resolve(&self, request: &PathResolutionRequest) -> PathResolutionResponse {
        let started = Instant::now();
        let cache_key = request.cache_key();

        let validation = self.validator.validate(request);
        if !validation.valid {
            debug!(cache_key = %cache_key, errors = validation.errors.len(), "request rejected");
            let mut metadata =
                PathResolutionMetadata::empty(request.path_type(), request.installation_type());
            metadata.resolution_reason = "request failed validation".to_string();
            let mut response = PathResolutionResponse::rejected(
                cache_key,
                metadata,
                validation.errors,
                validation.warnings,
            );
            response.duration_seconds = started.elapsed().as_secs_f64();
            return response;
        }

        let cacheable = self.cache.should_cache(request);
        if cacheable {
            if let Some(mut cached) = self.cache.get(request) {
                debug!(cache_key = %cache_key, "served from cache");
                cached.metadata.was_from_cache = true;
                cached.duration_seconds = started.elapsed().as_secs_f64();
                return cached;
            }
        }

        let outcome = self.dispatcher.dispatch(request);
        let mut response = self.build_response(request, cache_key, validation.warnings, outcome);
        response.duration_seconds = started.elapsed().as_secs_f64();

        info!(
            status = %response.status,
            path_type = %request.path_type(),
            installation_type = %request.installation_type(),
            "resolved"
        );

        // Negative results are cached too; errors never are.
        if cacheable && response.status != ResolutionStatus::Error {
            self.cache.put(request, &response);
        }

        response
    }

    /// Remove cached entries matching `criteria`.
    pub fn invalidate(&self, criteria: &InvalidationCriteria) -> usize {
        self.cache.invalidate(criteria)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn build_response(
        &self,
        request: &PathResolutionRequest,
        cache_key: String,
        mut warnings: Vec<String>,
        outcome: DispatchOutcome,
    ) -> PathResolutionResponse {
        let mut metadata =
            PathResolutionMetadata::empty(request.path_type(), request.installation_type());
        metadata.candidate_paths = outcome.candidate_paths;
        metadata.strategies_attempted = outcome.strategies_attempted;
        metadata.cache_hit_ratio = self.cache.stats().hit_ratio();

        let mut errors = Vec::new();
        let strategy_warnings = outcome.warnings;

        let (status, resolved_path) = match outcome.winner {
            Some((strategy, winner)) => {
                metadata.strategy_used = Some(strategy);
                metadata.confidence_score = winner.confidence;
                metadata.resolution_reason = winner.rationale;
                (ResolutionStatus::Success, Some(winner.path))
            }
            None if outcome.all_failed => {
                metadata.resolution_reason = ALL_STRATEGIES_FAILED.to_string();
                errors.push(ALL_STRATEGIES_FAILED.to_string());
                errors.extend(strategy_warnings.iter().cloned());
                (ResolutionStatus::Error, None)
            }
            None => {
                metadata.resolution_reason = "no strategy produced an acceptable candidate".to_string();
                (ResolutionStatus::NotFound, None)
            }
        };
        warnings.extend(strategy_warnings);

        PathResolutionResponse {
            status,
            resolved_path,
            alternative_paths: outcome.alternatives,
            warnings,
            errors,
            metadata,
            cache_key,
            duration_seconds: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CacheOptions, InstallationType, PathType};
    use crate::ports::should_cache;
    use crate::strategy::Strategy;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every call and stores responses in a plain map.
    #[derive(Default)]
    struct RecordingCache {
        entries: Mutex<HashMap<String, PathResolutionResponse>>,
        gets: Mutex<u64>,
        puts: Mutex<Vec<ResolutionStatus>>,
        invalidated: Mutex<Vec<InvalidationCriteria>>,
    }

    impl PathCache for RecordingCache {
        fn get(&self, request: &PathResolutionRequest) -> Option<PathResolutionResponse> {
            *self.gets.lock().unwrap() += 1;
            self.entries.lock().unwrap().get(&request.cache_key()).cloned()
        }

        fn put(&self, request: &PathResolutionRequest, response: &PathResolutionResponse) {
            self.puts.lock().unwrap().push(response.status);
            self.entries
                .lock()
                .unwrap()
                .insert(request.cache_key(), response.clone());
        }

        fn invalidate(&self, criteria: &InvalidationCriteria) -> usize {
            self.invalidated.lock().unwrap().push(criteria.clone());
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|key, _| !criteria.matches(key));
            before - entries.len()
        }

        fn clear(&self) {
            self.entries.lock().unwrap().clear();
        }

        fn stats(&self) -> CacheStats {
            CacheStats {
                entry_count: self.entries.lock().unwrap().len(),
                ..CacheStats::default()
            }
        }

        fn is_valid(&self, request: &PathResolutionRequest) -> bool {
            should_cache(request) && self.entries.lock().unwrap().contains_key(&request.cache_key())
        }
    }

    fn resolver(cache: Arc<RecordingCache>) -> PathResolver {
        PathResolver::new(cache, &ResolverSettings::with_defaults()).unwrap()
    }

    fn extension_request(root: &Path, key: &str, installation: InstallationType) -> PathResolutionRequest {
        PathResolutionRequest::builder()
            .path_type(PathType::Extension)
            .installation_path(root)
            .installation_type(installation)
            .extension_key(key)
            .build()
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = ResolverSettings {
            memory_capacity: 0,
            ..ResolverSettings::default()
        };
        assert!(PathResolver::new(Arc::new(RecordingCache::default()), &settings).is_err());
    }

    #[test]
    fn test_success_is_cached_and_served() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor/acme/ext")).unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));
        let request = extension_request(dir.path(), "ext", InstallationType::ComposerStandard);

        let first = resolver.resolve(&request);
        assert!(first.is_success());
        assert!(!first.metadata.was_from_cache);
        assert_eq!(first.metadata.strategy_used, Some(Strategy::ComposerPackages));

        let second = resolver.resolve(&request);
        assert!(second.metadata.was_from_cache);
        assert_eq!(second.resolved_path, first.resolved_path);
        assert_eq!(cache.puts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_not_found_is_cached() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));

        let response = resolver.resolve(&extension_request(
            dir.path(),
            "missing",
            InstallationType::LegacySource,
        ));

        assert!(response.is_not_found());
        assert!(response.resolved_path.is_none());
        assert!(!response.alternative_paths.is_empty());
        assert_eq!(*cache.puts.lock().unwrap(), vec![ResolutionStatus::NotFound]);
    }

    #[test]
    fn test_validation_failure_skips_cache() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));
        let request = PathResolutionRequest::unchecked(
            PathType::VendorDir,
            dir.path(),
            InstallationType::LegacySource,
            None,
        );

        let response = resolver.resolve(&request);

        assert!(response.is_error());
        assert!(response.metadata.strategies_attempted.is_empty());
        assert_eq!(*cache.gets.lock().unwrap(), 0);
        assert!(cache.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_total_failure_is_error_and_not_cached() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));

        let response = resolver.resolve(&extension_request(
            dir.path(),
            "../escape",
            InstallationType::LegacySource,
        ));

        assert!(response.is_error());
        assert_eq!(response.errors[0], ALL_STRATEGIES_FAILED);
        assert!(response.errors.len() > 1);
        assert!(cache.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_uncacheable_request_never_touches_cache() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));
        let request = PathResolutionRequest::builder()
            .path_type(PathType::VendorDir)
            .installation_path(dir.path())
            .installation_type(InstallationType::ComposerStandard)
            .cache_options(CacheOptions::disabled())
            .build()
            .unwrap();

        assert!(resolver.resolve(&request).is_success());
        assert_eq!(*cache.gets.lock().unwrap(), 0);
        assert!(cache.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalidate_passes_through() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(RecordingCache::default());
        let resolver = resolver(Arc::clone(&cache));
        resolver.resolve(&extension_request(dir.path(), "news", InstallationType::LegacySource));
        assert_eq!(resolver.cache_stats().entry_count, 1);

        let removed = resolver.invalidate(&InvalidationCriteria::new().path_type(PathType::Extension));

        assert_eq!(removed, 1);
        assert_eq!(cache.invalidated.lock().unwrap().len(), 1);
        resolver.clear_cache();
        assert_eq!(resolver.cache_stats().entry_count, 0);
    }
}
