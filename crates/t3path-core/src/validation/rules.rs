//! Caller-named custom validation rules.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use serde_json::Value;

use crate::domain::PathResolutionRequest;

/// A named check a caller can attach to a request.
///
/// `check` returns the violations it found; an `Err` means the parameters
/// themselves were unusable.
pub trait CustomRule: Send + Sync {
    fn check(&self, request: &PathResolutionRequest, params: &Value) -> anyhow::Result<Vec<String>>;
}

/// `min_path_length`: a number, or `{"length": n}`.
pub struct MinPathLength;

impl CustomRule for MinPathLength {
    fn check(&self, request: &PathResolutionRequest, params: &Value) -> anyhow::Result<Vec<String>> {
        let min = params
            .as_u64()
            .or_else(|| params.get("length").and_then(Value::as_u64))
            .ok_or_else(|| anyhow!("expected a non-negative integer or {{\"length\": n}}"))?;

        let path = request.installation_path().to_string_lossy();
        let length = u64::try_from(path.chars().count()).unwrap_or(u64::MAX);
        if length < min {
            return Ok(vec![format!(
                "Installation path is shorter than {min} characters: {path}"
            )]);
        }
        Ok(Vec::new())
    }
}

/// `required_subdirs`: relative directories that must exist below the root.
pub struct RequiredSubdirs;

impl CustomRule for RequiredSubdirs {
    fn check(&self, request: &PathResolutionRequest, params: &Value) -> anyhow::Result<Vec<String>> {
        let root = request.installation_path();
        let mut errors = Vec::new();
        for subdir in string_list(params)? {
            if Path::new(subdir).is_absolute() {
                bail!("subdirectory '{subdir}' must be relative");
            }
            if !root.join(subdir).is_dir() {
                errors.push(format!("Required subdirectory is missing: {subdir}"));
            }
        }
        Ok(errors)
    }
}

/// `forbidden_paths`: the root must not equal or lie below any of these.
pub struct ForbiddenPaths;

impl CustomRule for ForbiddenPaths {
    fn check(&self, request: &PathResolutionRequest, params: &Value) -> anyhow::Result<Vec<String>> {
        let root = request.installation_path();
        let mut errors = Vec::new();
        for forbidden in string_list(params)? {
            let forbidden = PathBuf::from(forbidden);
            if root.starts_with(&forbidden) {
                errors.push(format!(
                    "Installation path {} is inside forbidden path {}",
                    root.display(),
                    forbidden.display()
                ));
            }
        }
        Ok(errors)
    }
}

fn string_list(params: &Value) -> anyhow::Result<Vec<&str>> {
    let items = params
        .as_array()
        .context("expected an array of strings")?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| anyhow!("expected non-empty strings, got {item}"))
        })
        .collect()
}
