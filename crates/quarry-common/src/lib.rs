//! Quarry Common - Shared types, errors, and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::{MetadataConfig, OptimizerConfig, SargConfig};
pub use error::{QuarryError, Result};
pub use types::NullSemantics;
