//! Path resolution engine for TYPO3 installations.
//!
//! Locates extension directories, vendor directories, configuration files
//! and web roots across installation archetypes whose physical layout
//! differs. A validated [`PathResolutionRequest`] goes through
//! [`PathResolver::resolve`], which validates it, consults the cache port,
//! runs the pruned strategy chain and stores the outcome.
//!
//! Cache adapters live in `t3path-cache`; this crate only defines the
//! [`PathCache`] port.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod settings;
pub mod strategy;
pub mod validation;

pub use domain::{
    ArtifactKind, CacheOptions, DEFAULT_MAX_DEPTH, ExtensionIdentifier, InstallationType,
    PathConfiguration, PathResolutionMetadata, PathResolutionRequest, PathResolutionResponse,
    PathType, RequestBuilder, RequiredRule, ResolutionStatus, ValidationResult,
};
pub use error::{ParseError, RequestError, StrategyError};
pub use ports::{CacheStats, InvalidationCriteria, NoopCache, PathCache, should_cache};
pub use services::{ALL_STRATEGIES_FAILED, PathResolver};
pub use settings::{
    DEFAULT_MAX_DEPTH_WARNING, DEFAULT_MEMORY_CAPACITY, DEFAULT_TTL_SECS,
    DEFAULT_WARM_TTL_THRESHOLD, ResolverSettings, SettingsError, validate_settings,
};
pub use strategy::{
    Candidate, DispatchOutcome, PriorityTier, Strategy, StrategyDispatcher, StrategyInput,
};
pub use validation::{CustomRule, RequestValidator};

// Only the integration tests install a subscriber.
#[cfg(test)]
use tracing_subscriber as _;
