//! Engine services.
//!
//! Services orchestrate between ports and domain logic. They never know
//! which cache adapter they talk to.

mod resolver;

pub use resolver::{ALL_STRATEGIES_FAILED, PathResolver};
