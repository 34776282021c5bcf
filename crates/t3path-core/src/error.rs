//! Error types for request construction and strategy execution.
//!
//! Validation failures are not errors in this sense: they are reported as
//! messages inside a [`crate::domain::ValidationResult`] and surface as an
//! `ERROR` response status.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{InstallationType, PathType};

/// Errors that prevent a request from being constructed.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A required builder field was never set.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The installation path does not exist.
    #[error("Installation path does not exist: {}", .0.display())]
    PathDoesNotExist(PathBuf),

    /// The installation path exists but could not be canonicalized.
    #[error("Cannot canonicalize installation path {}: {reason}", path.display())]
    Canonicalize { path: PathBuf, reason: String },

    /// The path type cannot be resolved against the installation type.
    #[error("Path type '{path_type}' is not compatible with installation type '{installation_type}'")]
    IncompatibleTypes {
        path_type: PathType,
        installation_type: InstallationType,
    },

    /// Path type `extension` was requested without an identifier.
    #[error("Path type 'extension' requires an extension identifier")]
    MissingExtensionIdentifier,

    /// The extension key is blank.
    #[error("Extension key cannot be empty")]
    EmptyExtensionKey,

    /// The extension key contains a character reserved by the cache key.
    #[error("Extension key contains a reserved character: {0}")]
    InvalidExtensionKey(String),
}

/// Errors raised by a single strategy. Isolated per strategy by the dispatcher.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A path segment derived from caller input would escape its directory.
    #[error("unsafe path segment '{0}'")]
    UnsafeSegment(String),

    /// A directory listing failed for a reason other than absence.
    #[error("cannot read {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    /// An exclude pattern could not be compiled.
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors parsing catalog identifiers from strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown path type: {0}")]
    UnknownPathType(String),

    #[error("Unknown installation type: {0}")]
    UnknownInstallationType(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown invalidation criterion: {0}")]
    UnknownCriterion(String),
}
