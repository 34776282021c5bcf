//! Path types and their static catalogs.
//!
//! Every table here is a `const` lookup keyed by the enum variant, so adding a
//! variant forces every catalog to be updated at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{InstallationType, ParseError};
use crate::strategy::Strategy;

/// Category of filesystem artifact a caller is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    /// A single extension directory, identified by its extension key.
    Extension,
    /// The directory holding local (third-party) extensions.
    ExtensionDir,
    /// The directory holding system extensions shipped with the core.
    SystemExtensionDir,
    /// Composer's vendor directory.
    VendorDir,
    /// The main system configuration file.
    ConfigFile,
    /// The public web root.
    WebDir,
}

/// Kind of filesystem entry a path type must resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Directory,
    File,
}

/// Checks a path type requires before any strategy may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRule {
    /// The request must carry an extension identifier.
    ExtensionIdentifier,
    /// The installation path must exist.
    Exists,
    /// The installation path must be readable.
    Readable,
    /// The installation path must be a directory.
    Directory,
}

impl RequiredRule {
    /// Rule name as it appears in validation messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtensionIdentifier => "extension_identifier",
            Self::Exists => "exists",
            Self::Readable => "readable",
            Self::Directory => "directory",
        }
    }
}

const ALL_INSTALLATIONS: &[InstallationType] = &InstallationType::ALL;

const NON_LEGACY_INSTALLATIONS: &[InstallationType] = &[
    InstallationType::ComposerStandard,
    InstallationType::ComposerCustom,
    InstallationType::Docker,
    InstallationType::Custom,
    InstallationType::AutoDetect,
];

impl PathType {
    /// Every path type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Extension,
        Self::ExtensionDir,
        Self::SystemExtensionDir,
        Self::VendorDir,
        Self::ConfigFile,
        Self::WebDir,
    ];

    /// Stable snake_case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::ExtensionDir => "extension_dir",
            Self::SystemExtensionDir => "system_extension_dir",
            Self::VendorDir => "vendor_dir",
            Self::ConfigFile => "config_file",
            Self::WebDir => "web_dir",
        }
    }

    /// Installation types this path type can be resolved against.
    pub const fn compatible_installation_types(self) -> &'static [InstallationType] {
        match self {
            // Legacy source trees have no Composer vendor directory.
            Self::VendorDir => NON_LEGACY_INSTALLATIONS,
            Self::Extension
            | Self::ExtensionDir
            | Self::SystemExtensionDir
            | Self::ConfigFile
            | Self::WebDir => ALL_INSTALLATIONS,
        }
    }

    /// Whether this path type may be resolved against `installation_type`.
    pub fn is_compatible_with(self, installation_type: InstallationType) -> bool {
        self.compatible_installation_types()
            .contains(&installation_type)
    }

    /// Rules the validator enforces for this path type.
    pub const fn required_rules(self) -> &'static [RequiredRule] {
        match self {
            Self::Extension => &[
                RequiredRule::ExtensionIdentifier,
                RequiredRule::Exists,
                RequiredRule::Directory,
            ],
            Self::ConfigFile => &[RequiredRule::Exists, RequiredRule::Readable],
            Self::ExtensionDir | Self::SystemExtensionDir | Self::VendorDir | Self::WebDir => {
                &[RequiredRule::Exists, RequiredRule::Directory]
            }
        }
    }

    /// Default ordered fallback chain, before pruning by installation type.
    pub const fn default_chain(self) -> &'static [Strategy] {
        match self {
            Self::Extension | Self::ConfigFile => &[
                Strategy::ComposerPackages,
                Strategy::LegacyTypo3conf,
                Strategy::ComposerCustomLayout,
                Strategy::ContainerMount,
                Strategy::SearchDirectories,
                Strategy::DepthScan,
            ],
            Self::ExtensionDir => &[
                Strategy::ComposerPackages,
                Strategy::LegacyTypo3conf,
                Strategy::ComposerCustomLayout,
                Strategy::ContainerMount,
                Strategy::SearchDirectories,
            ],
            Self::SystemExtensionDir => &[
                Strategy::ComposerPackages,
                Strategy::LegacyTypo3conf,
                Strategy::ContainerMount,
                Strategy::SearchDirectories,
            ],
            Self::VendorDir => &[
                Strategy::ComposerPackages,
                Strategy::ComposerCustomLayout,
                Strategy::ContainerMount,
                Strategy::SearchDirectories,
            ],
            Self::WebDir => &[
                Strategy::ComposerPackages,
                Strategy::LegacyTypo3conf,
                Strategy::ComposerCustomLayout,
                Strategy::ContainerMount,
            ],
        }
    }

    /// Kind of entry a resolved path must be.
    pub const fn artifact_kind(self) -> ArtifactKind {
        match self {
            Self::ConfigFile => ArtifactKind::File,
            _ => ArtifactKind::Directory,
        }
    }

    /// Entry names searched for by name-based strategies.
    ///
    /// `Extension` has no fixed name; the extension key is used instead.
    pub const fn target_names(self) -> &'static [&'static str] {
        match self {
            Self::Extension => &[],
            Self::ExtensionDir => &["ext"],
            Self::SystemExtensionDir => &["sysext"],
            Self::VendorDir => &["vendor"],
            Self::ConfigFile => &["settings.php", "LocalConfiguration.php"],
            Self::WebDir => &["public", "web", "htdocs"],
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownPathType(s.to_string()))
    }
}
