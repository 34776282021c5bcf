//! Shared fixtures for t3path-core integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once. Honors `RUST_LOG`.
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

/// Create every relative directory in `dirs` below `root`.
pub fn mkdirs(root: &Path, dirs: &[&str]) {
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}

/// Create a file (and its parents) below `root`.
pub fn touch(root: &Path, file: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"<?php return [];\n").unwrap();
}

/// Composer installation with a `public/` web root and the given packages.
pub fn composer_site(packages: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    mkdirs(
        dir.path(),
        &["public/typo3conf/ext", "vendor/typo3/cms-core", "config/system"],
    );
    touch(dir.path(), "composer.json");
    touch(dir.path(), "config/system/settings.php");
    for package in packages {
        mkdirs(dir.path(), &[&format!("vendor/{package}")]);
    }
    dir
}

/// Classic source tree with local extensions under `typo3conf/ext`.
pub fn legacy_site(extensions: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    mkdirs(dir.path(), &["typo3/sysext/core", "typo3conf/ext"]);
    touch(dir.path(), "typo3conf/LocalConfiguration.php");
    for ext in extensions {
        mkdirs(dir.path(), &[&format!("typo3conf/ext/{ext}")]);
    }
    dir
}

/// Container root with a Composer installation mounted at `var/www/html`.
pub fn container_site(packages: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    mkdirs(dir.path(), &["var/www/html/public/typo3conf/ext", ".ddev"]);
    for package in packages {
        mkdirs(dir.path(), &[&format!("var/www/html/vendor/{package}")]);
    }
    dir
}
