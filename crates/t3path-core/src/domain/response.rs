//! Resolution outcomes.
//!
//! These types are serde-stable so cache adapters can persist them and
//! collaborators can pass them across process boundaries.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{InstallationType, PathType};
use crate::strategy::Strategy;

/// Terminal status of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// A path was resolved.
    Success,
    /// No strategy produced an acceptable candidate. Not an error.
    NotFound,
    /// The request was rejected or every strategy failed.
    Error,
    /// Reserved for collaborators that merge several responses.
    Partial,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Error => "ERROR",
            Self::Partial => "PARTIAL",
        })
    }
}

/// Outcome of pre-flight request validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Build a result; validity is derived from the error list.
    pub fn from_messages(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Diagnostics describing how a response was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResolutionMetadata {
    pub path_type: PathType,
    pub installation_type: InstallationType,
    /// Strategy that produced the resolved path, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub strategy_used: Option<Strategy>,
    /// Confidence in the resolved path, 0–100. Zero when nothing resolved.
    pub confidence_score: u8,
    /// Every candidate evaluated, in evaluation order.
    #[serde(default)]
    pub candidate_paths: Vec<PathBuf>,
    /// Strategies that ran, in execution order.
    #[serde(default)]
    pub strategies_attempted: Vec<Strategy>,
    /// Cache hit ratio observed when the response was produced.
    pub cache_hit_ratio: f64,
    pub was_from_cache: bool,
    pub resolution_reason: String,
}

impl PathResolutionMetadata {
    /// Metadata for a response that never reached strategy dispatch.
    pub fn empty(path_type: PathType, installation_type: InstallationType) -> Self {
        Self {
            path_type,
            installation_type,
            strategy_used: None,
            confidence_score: 0,
            candidate_paths: Vec::new(),
            strategies_attempted: Vec::new(),
            cache_hit_ratio: 0.0,
            was_from_cache: false,
            resolution_reason: String::new(),
        }
    }
}

/// Result of a resolution.
///
/// `resolved_path` is `Some` exactly when `status` is [`ResolutionStatus::Success`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResolutionResponse {
    pub status: ResolutionStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolved_path: Option<PathBuf>,
    /// Ranked best-first; never contains `resolved_path`.
    #[serde(default)]
    pub alternative_paths: Vec<PathBuf>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub metadata: PathResolutionMetadata,
    pub cache_key: String,
    pub duration_seconds: f64,
}

impl PathResolutionResponse {
    /// A response rejected before dispatch (validation failure).
    pub fn rejected(
        cache_key: String,
        metadata: PathResolutionMetadata,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            status: ResolutionStatus::Error,
            resolved_path: None,
            alternative_paths: Vec::new(),
            warnings,
            errors,
            metadata,
            cache_key,
            duration_seconds: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResolutionStatus::Success
    }

    pub fn is_not_found(&self) -> bool {
        self.status == ResolutionStatus::NotFound
    }

    pub fn is_error(&self) -> bool {
        self.status == ResolutionStatus::Error
    }

    /// Rough heap footprint, used for cache statistics.
    pub fn approximate_size(&self) -> usize {
        let path_len = |p: &PathBuf| p.as_os_str().len();
        let strings = |v: &[String]| v.iter().map(String::len).sum::<usize>();

        std::mem::size_of::<Self>()
            + self.resolved_path.as_ref().map_or(0, path_len)
            + self.alternative_paths.iter().map(path_len).sum::<usize>()
            + self.metadata.candidate_paths.iter().map(path_len).sum::<usize>()
            + strings(&self.warnings)
            + strings(&self.errors)
            + self.metadata.resolution_reason.len()
            + self.cache_key.len()
    }
}

impl fmt::Display for PathResolutionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.metadata.path_type)?;
        if let Some(path) = &self.resolved_path {
            write!(f, " -> {}", path.display())?;
        }
        if let Some(strategy) = self.metadata.strategy_used {
            write!(f, " via {strategy} ({}%)", self.metadata.confidence_score)?;
        }
        if !self.alternative_paths.is_empty() {
            write!(f, ", {} alternative(s)", self.alternative_paths.len())?;
        }
        Ok(())
    }
}
