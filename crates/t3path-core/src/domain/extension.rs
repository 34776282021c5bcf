//! Extension identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a single extension by key and optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionIdentifier {
    /// Extension key, e.g. `news` or `my_sitepackage`.
    pub key: String,
    /// Version the caller expects, if any. Informational for the engine.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
}

impl ExtensionIdentifier {
    /// Create an identifier without a version.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: None,
        }
    }

    /// Create an identifier with a version.
    pub fn with_version(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: Some(version.into()),
        }
    }

    /// The Composer package name form of the key (`my_ext` → `my-ext`).
    pub fn package_name(&self) -> String {
        self.key.replace('_', "-")
    }
}

impl fmt::Display for ExtensionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{version}", self.key),
            None => write!(f, "{}@*", self.key),
        }
    }
}
