//! Layout-specific lookup strategies.
//!
//! The strategy catalog is a closed enum. Each variant knows which
//! installation types it applies to and its priority tier, and candidate
//! generation is dispatched through a single exhaustive `match` in
//! [`Strategy::candidates`].
//!
//! ## Architecture
//!
//! - `layouts`: fixed-shape rules for Composer, legacy and container layouts
//! - `scan`: caller-directed search directories and the bounded depth scan
//! - `dispatch`: ordering, execution, winner selection and alternative ranking

mod dispatch;
mod layouts;
mod scan;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{ExtensionIdentifier, InstallationType, ParseError, PathConfiguration, PathType};
use crate::error::StrategyError;

pub use dispatch::{DispatchOutcome, StrategyDispatcher};

/// Five-level priority used to order a pruned fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PriorityTier {
    Fallback = 1,
    Low = 2,
    Normal = 3,
    High = 4,
    Critical = 5,
}

/// A named lookup rule for one layout convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Composer layout with `vendor/` and a `public/` web root.
    ComposerPackages,
    /// Composer layout with renamed web or vendor roots.
    ComposerCustomLayout,
    /// Classic `typo3conf/ext` source tree.
    LegacyTypo3conf,
    /// Composer or legacy layout below a container mount point.
    ContainerMount,
    /// Caller-supplied search directories.
    SearchDirectories,
    /// Bounded recursive walk of the installation root.
    DepthScan,
}

const COMPOSER_STANDARD_TARGETS: &[InstallationType] = &[
    InstallationType::ComposerStandard,
    InstallationType::Docker,
    InstallationType::Custom,
    InstallationType::AutoDetect,
];

const COMPOSER_CUSTOM_TARGETS: &[InstallationType] = &[
    InstallationType::ComposerCustom,
    InstallationType::Docker,
    InstallationType::Custom,
    InstallationType::AutoDetect,
];

const LEGACY_TARGETS: &[InstallationType] = &[
    InstallationType::LegacySource,
    InstallationType::Docker,
    InstallationType::Custom,
    InstallationType::AutoDetect,
];

const CONTAINER_TARGETS: &[InstallationType] =
    &[InstallationType::Docker, InstallationType::AutoDetect];

const ALL_TARGETS: &[InstallationType] = &InstallationType::ALL;

impl Strategy {
    pub const ALL: [Self; 6] = [
        Self::ComposerPackages,
        Self::ComposerCustomLayout,
        Self::LegacyTypo3conf,
        Self::ContainerMount,
        Self::SearchDirectories,
        Self::DepthScan,
    ];

    /// Stable snake_case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComposerPackages => "composer_packages",
            Self::ComposerCustomLayout => "composer_custom_layout",
            Self::LegacyTypo3conf => "legacy_typo3conf",
            Self::ContainerMount => "container_mount",
            Self::SearchDirectories => "search_directories",
            Self::DepthScan => "depth_scan",
        }
    }

    /// Tier before any installation-specific boost.
    pub const fn base_tier(self) -> PriorityTier {
        match self {
            Self::ComposerPackages | Self::LegacyTypo3conf => PriorityTier::High,
            Self::ComposerCustomLayout | Self::ContainerMount => PriorityTier::Normal,
            Self::SearchDirectories => PriorityTier::Low,
            Self::DepthScan => PriorityTier::Fallback,
        }
    }

    pub const fn compatible_installation_types(self) -> &'static [InstallationType] {
        match self {
            Self::ComposerPackages => COMPOSER_STANDARD_TARGETS,
            Self::ComposerCustomLayout => COMPOSER_CUSTOM_TARGETS,
            Self::LegacyTypo3conf => LEGACY_TARGETS,
            Self::ContainerMount => CONTAINER_TARGETS,
            Self::SearchDirectories | Self::DepthScan => ALL_TARGETS,
        }
    }

    pub fn is_compatible_with(self, installation_type: InstallationType) -> bool {
        self.compatible_installation_types()
            .contains(&installation_type)
    }

    /// The strategy that implements an archetype's own convention.
    pub const fn native_for(installation_type: InstallationType) -> Option<Self> {
        match installation_type {
            InstallationType::ComposerStandard => Some(Self::ComposerPackages),
            InstallationType::ComposerCustom => Some(Self::ComposerCustomLayout),
            InstallationType::LegacySource => Some(Self::LegacyTypo3conf),
            InstallationType::Docker => Some(Self::ContainerMount),
            InstallationType::Custom => Some(Self::SearchDirectories),
            InstallationType::AutoDetect => None,
        }
    }

    /// Tier used for ordering against a given installation type.
    ///
    /// The archetype's native strategy is raised to [`PriorityTier::Critical`].
    pub fn effective_tier(self, installation_type: InstallationType) -> PriorityTier {
        if Self::native_for(installation_type) == Some(self) {
            PriorityTier::Critical
        } else {
            self.base_tier()
        }
    }

    /// Produce candidates for `input`.
    pub fn candidates(self, input: &StrategyInput<'_>) -> Result<Vec<Candidate>, StrategyError> {
        match self {
            Self::ComposerPackages => {
                layouts::composer(input.installation_path, input, &layouts::STANDARD_COMPOSER)
            }
            Self::ComposerCustomLayout => {
                layouts::composer(input.installation_path, input, &layouts::CUSTOM_COMPOSER)
            }
            Self::LegacyTypo3conf => layouts::legacy(input.installation_path, input, 0),
            Self::ContainerMount => layouts::container(input),
            Self::SearchDirectories => scan::search_directories(input),
            Self::DepthScan => scan::depth_scan(input),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownStrategy(s.to_string()))
    }
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub installation_path: &'a Path,
    pub path_type: PathType,
    pub extension: Option<&'a ExtensionIdentifier>,
    pub configuration: &'a PathConfiguration,
    /// Upper bound on candidates produced by the depth scan.
    pub scan_limit: usize,
}

/// A possible location for the requested artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// 0–100.
    pub confidence: u8,
    /// Short human-readable reason this location was proposed.
    pub rationale: String,
}

impl Candidate {
    pub fn new(path: PathBuf, confidence: u8, rationale: impl Into<String>) -> Self {
        Self {
            path,
            confidence: confidence.min(100),
            rationale: rationale.into(),
        }
    }
}

/// Reject caller-derived names that could escape their parent directory.
pub(crate) fn safe_segment(segment: &str) -> Result<&str, StrategyError> {
    let unsafe_segment = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if unsafe_segment {
        Err(StrategyError::UnsafeSegment(segment.to_string()))
    } else {
        Ok(segment)
    }
}
