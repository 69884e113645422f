use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Confidence;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid engine config: {0}")]
    Invalid(String),
}

/// Engine tuning. Every key is optional in TOML; missing keys take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Longer input is cut to this many bytes and the run is flagged partial.
    pub max_input_bytes: usize,
    /// Matching allowance per extractor.
    pub field_budget_ms: u64,
    /// Run extractors on the rayon pool.
    pub parallel: bool,
    pub high_confidence: f32,
    pub medium_confidence: f32,
    pub max_title_lines: usize,
    pub max_store_lines: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            max_input_bytes: 64 * 1024,
            field_budget_ms: 250,
            parallel: true,
            high_confidence: 0.75,
            medium_confidence: 0.50,
            max_title_lines: 8,
            max_store_lines: 6,
        }
    }
}

impl ExtractionConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ExtractionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_bytes == 0 {
            return Err(ConfigError::Invalid("max_input_bytes must be positive".into()));
        }
        if self.field_budget_ms == 0 {
            return Err(ConfigError::Invalid("field_budget_ms must be positive".into()));
        }
        let ordered = self.medium_confidence > 0.0
            && self.medium_confidence <= self.high_confidence
            && self.high_confidence <= 1.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "confidence thresholds must satisfy 0 < medium <= high <= 1 (got medium={}, high={})",
                self.medium_confidence, self.high_confidence
            )));
        }
        if self.max_title_lines == 0 || self.max_store_lines == 0 {
            return Err(ConfigError::Invalid("header line limits must be positive".into()));
        }
        Ok(())
    }

    pub fn field_budget(&self) -> Duration {
        Duration::from_millis(self.field_budget_ms)
    }

    pub fn confidence_for(&self, score: f32) -> Confidence {
        if score >= self.high_confidence {
            Confidence::High
        } else if score >= self.medium_confidence {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}
