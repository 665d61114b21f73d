// WHY: explicit configuration passed into every entry point; there are no process-wide defaults

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::{DecisionConfig, FitConfig};
use crate::error::{EndLinesError, Result};
use crate::features::FeatureConfig;

/// Everything that controls training; feature and decision settings are copied into the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndLinesConfig {
    pub features: FeatureConfig,
    pub fit: FitConfig,
    pub decision: DecisionConfig,
    /// Produce a per-newline report when training
    pub report: bool,
}

impl EndLinesConfig {
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.fit.validate()?;
        self.decision.validate()
    }

    /// Parse a TOML document; missing sections and keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EndLinesError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
