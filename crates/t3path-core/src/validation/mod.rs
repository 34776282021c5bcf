//! Pre-flight request validation.
//!
//! The validator accumulates every problem it finds instead of stopping at the
//! first one. A request is valid iff no errors were recorded; warnings never
//! block resolution.
//!
//! Checks, in order:
//! 1. Installation path existence, readability, directory-ness and layout markers
//! 2. Path-type required rules from the catalog
//! 3. Path type × installation type compatibility
//! 4. Configuration sanity
//! 5. Caller-named custom rules

mod rules;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{PathResolutionRequest, RequiredRule, ValidationResult};
use crate::settings::DEFAULT_MAX_DEPTH_WARNING;

pub use rules::{CustomRule, ForbiddenPaths, MinPathLength, RequiredSubdirs};

/// Validates requests before any strategy runs.
#[derive(Clone)]
pub struct RequestValidator {
    rules: BTreeMap<String, Arc<dyn CustomRule>>,
    max_depth_warning: usize,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH_WARNING)
    }
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("max_depth_warning", &self.max_depth_warning)
            .finish()
    }
}

impl RequestValidator {
    /// Validator with the built-in custom rules registered.
    pub fn new(max_depth_warning: usize) -> Self {
        let mut validator = Self {
            rules: BTreeMap::new(),
            max_depth_warning,
        };
        validator.register("min_path_length", MinPathLength);
        validator.register("required_subdirs", RequiredSubdirs);
        validator.register("forbidden_paths", ForbiddenPaths);
        validator
    }

    /// Register (or replace) a custom rule under `name`.
    pub fn register(&mut self, name: impl Into<String>, rule: impl CustomRule + 'static) {
        self.rules.insert(name.into(), Arc::new(rule));
    }

    /// Names of every registered custom rule, sorted.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn validate(&self, request: &PathResolutionRequest) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let path_exists = check_installation_path(request, &mut errors, &mut warnings);
        check_required_rules(request, path_exists, &mut errors);
        check_compatibility(request, &mut errors);
        self.check_configuration(request, &mut errors, &mut warnings);
        self.check_custom_rules(request, &mut errors);

        debug!(
            path_type = %request.path_type(),
            errors = errors.len(),
            warnings = warnings.len(),
            "validated request"
        );
        ValidationResult::from_messages(errors, warnings)
    }

    fn check_configuration(
        &self,
        request: &PathResolutionRequest,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        let config = request.path_configuration();

        if config.max_depth < 1 {
            errors.push("max_depth must be at least 1".to_string());
        } else if config.max_depth > self.max_depth_warning {
            warnings.push(format!(
                "max_depth {} exceeds {} and may cause slow scans",
                config.max_depth, self.max_depth_warning
            ));
        }

        if config.search_directories.iter().any(|d| d.trim().is_empty()) {
            warnings.push("search_directories contains an empty entry".to_string());
        }
        if config.exclude_patterns.iter().any(|p| p.trim().is_empty()) {
            warnings.push("exclude_patterns contains an empty entry".to_string());
        }
        if config.follow_symlinks && !config.validate_exists {
            warnings.push(
                "follow_symlinks is enabled while validate_exists is disabled; unverified symlink targets may be returned"
                    .to_string(),
            );
        }
    }

    fn check_custom_rules(&self, request: &PathResolutionRequest, errors: &mut Vec<String>) {
        for (name, params) in request.validation_rules() {
            let Some(rule) = self.rules.get(name) else {
                errors.push(format!("Unknown validation rule: {name}"));
                continue;
            };
            match rule.check(request, params) {
                Ok(violations) => errors.extend(violations),
                Err(e) => errors.push(format!("Invalid parameters for rule '{name}': {e:#}")),
            }
        }
    }
}

/// Returns whether the path exists; later path checks are skipped otherwise.
fn check_installation_path(
    request: &PathResolutionRequest,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> bool {
    let root = request.installation_path();

    if !root.exists() {
        errors.push(format!("Installation path does not exist: {}", root.display()));
        return false;
    }

    if !is_readable(root) {
        errors.push(format!("Installation path is not readable: {}", root.display()));
    }

    if !root.is_dir() {
        warnings.push(format!("Installation path is not a directory: {}", root.display()));
        return true;
    }

    let markers = request.installation_type().layout_markers();
    if !markers.is_empty() && !markers.iter().any(|m| root.join(m).exists()) {
        warnings.push(format!(
            "Installation path {} does not appear to be a TYPO3 installation (none of: {})",
            root.display(),
            markers.join(", ")
        ));
    }

    true
}

fn check_required_rules(request: &PathResolutionRequest, path_exists: bool, errors: &mut Vec<String>) {
    let root = request.installation_path();
    let path_type = request.path_type();

    for rule in path_type.required_rules() {
        match rule {
            RequiredRule::ExtensionIdentifier => {
                let present = request
                    .extension_identifier()
                    .is_some_and(|id| !id.key.trim().is_empty());
                if !present {
                    errors.push(format!("Path type '{path_type}' requires an extension identifier"));
                }
            }
            // Existence and readability were already reported above.
            RequiredRule::Exists | RequiredRule::Readable => {}
            RequiredRule::Directory => {
                if path_exists && !root.is_dir() {
                    errors.push(format!(
                        "Path type '{path_type}' requires the installation path to be a directory"
                    ));
                }
            }
        }
    }
}

fn check_compatibility(request: &PathResolutionRequest, errors: &mut Vec<String>) {
    let path_type = request.path_type();
    let installation_type = request.installation_type();
    if !path_type.is_compatible_with(installation_type) {
        errors.push(format!(
            "Path type '{path_type}' is not compatible with installation type '{installation_type}'"
        ));
    }
}

fn is_readable(path: &Path) -> bool {
    if path.is_dir() {
        fs::read_dir(path).is_ok()
    } else {
        fs::File::open(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExtensionIdentifier, InstallationType, PathConfiguration, PathType};
    use serde_json::{Value, json};
    use tempfile::tempdir;

    fn web_dir_request(root: &Path) -> PathResolutionRequest {
        PathResolutionRequest::builder()
            .path_type(PathType::WebDir)
            .installation_path(root)
            .installation_type(InstallationType::Custom)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let result = RequestValidator::default().validate(&PathResolutionRequest::unchecked(
            PathType::WebDir,
            "/nonexistent/path",
            InstallationType::Custom,
            None,
        ));
        assert!(!result.valid);
        assert!(result.errors[0].contains("does not exist"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_directory_is_valid_with_warning() {
        let dir = tempdir().unwrap();
        let result = RequestValidator::default().validate(&web_dir_request(dir.path()));
        assert!(result.valid, "{:?}", result.errors);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("does not appear to be a TYPO3 installation"))
        );
    }

    #[test]
    fn test_marker_silences_layout_warning() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("typo3conf")).unwrap();
        let result = RequestValidator::default().validate(&web_dir_request(dir.path()));
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_incompatible_pair_names_both_values() {
        let dir = tempdir().unwrap();
        let result = RequestValidator::default().validate(&PathResolutionRequest::unchecked(
            PathType::VendorDir,
            dir.path(),
            InstallationType::LegacySource,
            None,
        ));
        assert!(!result.valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("vendor_dir") && e.contains("legacy_source"))
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        let result = RequestValidator::default().validate(&PathResolutionRequest::unchecked(
            PathType::Extension,
            &file,
            InstallationType::ComposerStandard,
            Some(ExtensionIdentifier::new(" ")),
        ));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("not a directory")));
    }

    #[test]
    fn test_configuration_sanity() {
        let dir = tempdir().unwrap();
        let request = PathResolutionRequest::builder()
            .path_type(PathType::WebDir)
            .installation_path(dir.path())
            .installation_type(InstallationType::Custom)
            .path_configuration(PathConfiguration {
                max_depth: 80,
                search_directories: vec![String::new()],
                exclude_patterns: vec![" ".to_string()],
                validate_exists: false,
                follow_symlinks: true,
            })
            .build()
            .unwrap();

        let result = RequestValidator::default().validate(&request);
        assert!(result.valid);
        // layout + depth + two empty entries + symlink combination
        assert_eq!(result.warnings.len(), 5, "{:?}", result.warnings);

        let zero_depth = PathResolutionRequest::builder()
            .path_type(PathType::WebDir)
            .installation_path(dir.path())
            .installation_type(InstallationType::Custom)
            .path_configuration(PathConfiguration {
                max_depth: 0,
                ..PathConfiguration::default()
            })
            .build()
            .unwrap();
        let result = RequestValidator::default().validate(&zero_depth);
        assert!(result.errors.iter().any(|e| e.contains("max_depth")));
    }

    #[test]
    fn test_custom_rules() {
        let dir = tempdir().unwrap();
        let request = PathResolutionRequest::builder()
            .path_type(PathType::WebDir)
            .installation_path(dir.path())
            .installation_type(InstallationType::Custom)
            .validation_rule("required_subdirs", json!(["public"]))
            .validation_rule("min_path_length", json!("oops"))
            .validation_rule("colour", json!(true))
            .build()
            .unwrap();

        let result = RequestValidator::default().validate(&request);
        assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
        assert!(result.errors.iter().any(|e| e.contains("Unknown validation rule: colour")));
        assert!(result.errors.iter().any(|e| e.contains("'min_path_length'")));
    }

    struct NeverShared;

    impl CustomRule for NeverShared {
        fn check(&self, request: &PathResolutionRequest, _params: &Value) -> anyhow::Result<Vec<String>> {
            Ok(if request.installation_path().join("shared").exists() {
                vec!["shared directory present".to_string()]
            } else {
                Vec::new()
            })
        }
    }

    #[test]
    fn test_registered_rule_runs() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("shared")).unwrap();
        let request = PathResolutionRequest::builder()
            .path_type(PathType::WebDir)
            .installation_path(dir.path())
            .installation_type(InstallationType::Custom)
            .validation_rule("never_shared", Value::Null)
            .build()
            .unwrap();

        let mut validator = RequestValidator::default();
        validator.register("never_shared", NeverShared);
        assert!(validator.rule_names().any(|n| n == "never_shared"));

        let result = validator.validate(&request);
        assert_eq!(result.errors, vec!["shared directory present".to_string()]);
    }
}
