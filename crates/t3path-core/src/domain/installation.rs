//! Installation archetypes.
//!
//! An installation type is a hint supplied by an external detector. The engine
//! never detects layouts itself; it only uses the hint to prune and reorder
//! strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Recognized physical directory-layout conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationType {
    /// Composer-managed installation with the stock `public/` web root.
    ComposerStandard,
    /// Composer-managed installation with a renamed web root or vendor dir.
    ComposerCustom,
    /// Classic source tree with `typo3conf/ext` and a `typo3_src` symlink.
    LegacySource,
    /// Containerized installation mounted below a container root.
    Docker,
    /// Fully custom layout; only caller-supplied search directories apply.
    Custom,
    /// Layout was guessed by the detector and may change between runs.
    AutoDetect,
}

/// Markers shared by every TYPO3 layout, used when the hint carries no signature.
const ANY_LAYOUT_MARKERS: &[&str] = &[
    "typo3conf",
    "typo3",
    "typo3_src",
    "vendor/typo3",
    "public/typo3conf",
    "config/system",
    "composer.json",
];

impl InstallationType {
    /// Every archetype, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ComposerStandard,
        Self::ComposerCustom,
        Self::LegacySource,
        Self::Docker,
        Self::Custom,
        Self::AutoDetect,
    ];

    /// Stable snake_case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComposerStandard => "composer_standard",
            Self::ComposerCustom => "composer_custom",
            Self::LegacySource => "legacy_source",
            Self::Docker => "docker",
            Self::Custom => "custom",
            Self::AutoDetect => "auto_detect",
        }
    }

    /// Directories usually present for this archetype.
    ///
    /// Informational only: resolution never requires them to exist.
    pub const fn typical_directories(self) -> &'static [&'static str] {
        match self {
            Self::ComposerStandard => &["vendor", "public", "public/typo3conf", "config"],
            Self::ComposerCustom => &["vendor", "web", "app"],
            Self::LegacySource => &["typo3", "typo3conf", "typo3conf/ext", "typo3_src"],
            Self::Docker => &["app", "var/www/html", ".ddev"],
            Self::Custom | Self::AutoDetect => &[],
        }
    }

    /// Markers the validator looks for to decide whether a directory looks
    /// like an installation at all.
    pub const fn layout_markers(self) -> &'static [&'static str] {
        match self {
            Self::Custom | Self::AutoDetect => ANY_LAYOUT_MARKERS,
            other => other.typical_directories(),
        }
    }
}

impl fmt::Display for InstallationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallationType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownInstallationType(s.to_string()))
    }
}
