//! Quarry Optimizer Configuration

use crate::types::NullSemantics;
use serde::{Deserialize, Serialize};

/// Settings for metadata derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Upper bound on concatenated left x right keys produced for a join
    pub max_unique_key_combinations: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            max_unique_key_combinations: 1024,
        }
    }
}

impl MetadataConfig {
    pub fn validate(&self) -> Result<(), crate::QuarryError> {
        if self.max_unique_key_combinations == 0 {
            return Err(crate::QuarryError::Config(
                "metadata.max_unique_key_combinations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for sargable interval construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SargConfig {
    /// Null semantics for expressions created without an explicit policy
    pub default_null_semantics: NullSemantics,

    /// Round fractional coordinates over integral domains and detect overflow
    pub round_integral_coordinates: bool,
}

impl Default for SargConfig {
    fn default() -> Self {
        Self {
            default_null_semantics: NullSemantics::NullMatchesNothing,
            round_integral_coordinates: true,
        }
    }
}

/// Optimizer analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub metadata: MetadataConfig,
    pub sarg: SargConfig,
}

impl OptimizerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, crate::QuarryError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::QuarryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::QuarryError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), crate::QuarryError> {
        self.metadata.validate()
    }
}
