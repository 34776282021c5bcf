//! Shared fixtures for t3path-cache integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Once;

use t3path_core::{
    InstallationType, PathResolutionMetadata, PathResolutionRequest, PathResolutionResponse,
    PathType, ResolutionStatus,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Classic source tree with the given local extensions.
pub fn legacy_site(extensions: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("typo3/sysext/core")).unwrap();
    fs::create_dir_all(dir.path().join("typo3conf/ext")).unwrap();
    fs::write(dir.path().join("typo3conf/LocalConfiguration.php"), b"<?php").unwrap();
    for ext in extensions {
        fs::create_dir_all(dir.path().join("typo3conf/ext").join(ext)).unwrap();
    }
    dir
}

pub fn request(root: &Path, path_type: PathType) -> PathResolutionRequest {
    request_for(root, path_type, InstallationType::LegacySource)
}

pub fn request_for(
    root: &Path,
    path_type: PathType,
    installation_type: InstallationType,
) -> PathResolutionRequest {
    PathResolutionRequest::builder()
        .path_type(path_type)
        .installation_path(root)
        .installation_type(installation_type)
        .build()
        .unwrap()
}

pub fn response(
    request: &PathResolutionRequest,
    status: ResolutionStatus,
    resolved: Option<&Path>,
) -> PathResolutionResponse {
    PathResolutionResponse {
        status,
        resolved_path: resolved.map(Path::to_path_buf),
        alternative_paths: vec![],
        warnings: vec![],
        errors: vec![],
        metadata: PathResolutionMetadata::empty(request.path_type(), request.installation_type()),
        cache_key: request.cache_key(),
        duration_seconds: 0.0,
    }
}

pub fn not_found(request: &PathResolutionRequest) -> PathResolutionResponse {
    response(request, ResolutionStatus::NotFound, None)
}
