//! Long-lived VM host
//!
//! A [`Runtime`] owns configuration, cumulative statistics and the bridge
//! collaborator, and creates a fresh VM state for every call.

pub mod config;
pub mod host;
pub mod stats;

pub use config::{ConfigError, RuntimeConfiguration, DEFAULT_STACK_LIMIT};
pub use host::{Runtime, RuntimeError};
pub use stats::RuntimeStats;
