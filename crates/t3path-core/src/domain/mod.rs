//! Core domain types.
//!
//! Pure value types and static catalogs with no I/O beyond the
//! canonicalization performed by the request builder.

mod config;
mod extension;
mod installation;
mod path_type;
mod request;
mod response;

pub use crate::error::ParseError;

pub use config::{CacheOptions, DEFAULT_MAX_DEPTH, PathConfiguration};
pub use extension::ExtensionIdentifier;
pub use installation::InstallationType;
pub use path_type::{ArtifactKind, PathType, RequiredRule};
pub use request::{PathResolutionRequest, RequestBuilder};
pub use response::{
    PathResolutionMetadata, PathResolutionResponse, ResolutionStatus, ValidationResult,
};
