//! Immutable resolution requests and their validating builder.
//!
//! A [`PathResolutionRequest`] can only be obtained through
//! [`RequestBuilder::build`], which rejects structurally invalid input
//! (missing fields, nonexistent installation path, incompatible type pair).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{CacheOptions, ExtensionIdentifier, InstallationType, PathConfiguration, PathType};
use crate::error::RequestError;

/// Version tag embedded in every cache key.
const CACHE_KEY_PREFIX: &str = "t3path:v1";

/// A validated, immutable path resolution query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolutionRequest {
    path_type: PathType,
    installation_path: PathBuf,
    installation_type: InstallationType,
    path_configuration: PathConfiguration,
    extension_identifier: Option<ExtensionIdentifier>,
    validation_rules: BTreeMap<String, Value>,
    cache_options: CacheOptions,
}

impl PathResolutionRequest {
    /// Start building a request.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub const fn path_type(&self) -> PathType {
        self.path_type
    }

    /// Canonicalized absolute installation root.
    pub fn installation_path(&self) -> &Path {
        &self.installation_path
    }

    pub const fn installation_type(&self) -> InstallationType {
        self.installation_type
    }

    pub const fn path_configuration(&self) -> &PathConfiguration {
        &self.path_configuration
    }

    pub const fn extension_identifier(&self) -> Option<&ExtensionIdentifier> {
        self.extension_identifier.as_ref()
    }

    /// Caller-supplied custom validation rules (rule name → parameters).
    pub const fn validation_rules(&self) -> &BTreeMap<String, Value> {
        &self.validation_rules
    }

    pub const fn cache_options(&self) -> CacheOptions {
        self.cache_options
    }

    /// Deterministic fingerprint of every field except the cache options.
    ///
    /// The readable prefix keeps `path_type`, `installation_type` and
    /// `installation_path` visible so criteria-based invalidation can match
    /// on substrings; configuration and rules are folded into digests.
    pub fn cache_key(&self) -> String {
        let extension = self
            .extension_identifier
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);

        format!(
            "{CACHE_KEY_PREFIX};path_type={};installation_type={};installation_path={};extension={extension};config={};rules={}",
            self.path_type,
            self.installation_type,
            self.installation_path.to_string_lossy(),
            short_digest(&self.path_configuration),
            short_digest(&self.validation_rules),
        )
    }

    /// Build a request without any checks, for exercising the validator's
    /// defensive paths in tests.
    #[cfg(test)]
    pub(crate) fn unchecked(
        path_type: PathType,
        installation_path: impl Into<PathBuf>,
        installation_type: InstallationType,
        extension_identifier: Option<ExtensionIdentifier>,
    ) -> Self {
        Self {
            path_type,
            installation_path: installation_path.into(),
            installation_type,
            path_configuration: PathConfiguration::default(),
            extension_identifier,
            validation_rules: BTreeMap::new(),
            cache_options: CacheOptions::default(),
        }
    }
}

/// First 8 bytes of the SHA-256 of a value's JSON form, hex encoded.
fn short_digest<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest.iter().take(8).fold(String::with_capacity(16), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Builder for [`PathResolutionRequest`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    path_type: Option<PathType>,
    installation_path: Option<PathBuf>,
    installation_type: Option<InstallationType>,
    path_configuration: PathConfiguration,
    extension_identifier: Option<ExtensionIdentifier>,
    validation_rules: BTreeMap<String, Value>,
    cache_options: CacheOptions,
}

impl RequestBuilder {
    #[must_use]
    pub fn path_type(mut self, path_type: PathType) -> Self {
        self.path_type = Some(path_type);
        self
    }

    #[must_use]
    pub fn installation_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.installation_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn installation_type(mut self, installation_type: InstallationType) -> Self {
        self.installation_type = Some(installation_type);
        self
    }

    #[must_use]
    pub fn path_configuration(mut self, configuration: PathConfiguration) -> Self {
        self.path_configuration = configuration;
        self
    }

    #[must_use]
    pub fn extension_identifier(mut self, identifier: ExtensionIdentifier) -> Self {
        self.extension_identifier = Some(identifier);
        self
    }

    /// Shorthand for an identifier without a version.
    #[must_use]
    pub fn extension_key(self, key: impl Into<String>) -> Self {
        self.extension_identifier(ExtensionIdentifier::new(key))
    }

    /// Add a named custom validation rule. Later calls replace earlier ones.
    #[must_use]
    pub fn validation_rule(mut self, name: impl Into<String>, params: Value) -> Self {
        self.validation_rules.insert(name.into(), params);
        self
    }

    #[must_use]
    pub fn cache_options(mut self, options: CacheOptions) -> Self {
        self.cache_options = options;
        self
    }

    /// Validate structure and produce the request.
    pub fn build(self) -> Result<PathResolutionRequest, RequestError> {
        let path_type = self
            .path_type
            .ok_or(RequestError::MissingField("path_type"))?;
        let raw_path = self
            .installation_path
            .ok_or(RequestError::MissingField("installation_path"))?;
        let installation_type = self
            .installation_type
            .ok_or(RequestError::MissingField("installation_type"))?;

        if raw_path.as_os_str().is_empty() {
            return Err(RequestError::MissingField("installation_path"));
        }

        let installation_path = canonicalize(&raw_path)?;

        if !path_type.is_compatible_with(installation_type) {
            return Err(RequestError::IncompatibleTypes {
                path_type,
                installation_type,
            });
        }

        if path_type == PathType::Extension {
            match &self.extension_identifier {
                None => return Err(RequestError::MissingExtensionIdentifier),
                Some(id) if id.key.trim().is_empty() => {
                    return Err(RequestError::EmptyExtensionKey);
                }
                Some(_) => {}
            }
        }

        // `;` separates cache key fields.
        if let Some(id) = &self.extension_identifier {
            if id.key.contains(';') {
                return Err(RequestError::InvalidExtensionKey(id.key.clone()));
            }
        }

        Ok(PathResolutionRequest {
            path_type,
            installation_path,
            installation_type,
            path_configuration: self.path_configuration,
            extension_identifier: self.extension_identifier,
            validation_rules: self.validation_rules,
            cache_options: self.cache_options,
        })
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, RequestError> {
    std::fs::canonicalize(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RequestError::PathDoesNotExist(path.to_path_buf()),
        _ => RequestError::Canonicalize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })
}
