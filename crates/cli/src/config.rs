use std::path::Path;

use anyhow::Context;
use recu_core::CurrencyContext;
use recu_extract::ExtractionConfig;
use serde::{Deserialize, Serialize};

/// Contents of `recu.toml`. Every table is optional.
///
/// ```toml
/// brands = ["Target", "Whole Foods"]
/// categories = ["Electronics"]
///
/// [engine]
/// field_budget_ms = 100
///
/// [currency]
/// symbol = "€"
/// code = "EUR"
/// decimal_separator = ","
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub brands: Vec<String>,
    pub categories: Vec<String>,
    pub engine: ExtractionConfig,
    pub currency: Option<CurrencyContext>,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .engine
            .validate()
            .with_context(|| format!("Invalid [engine] table in {}", path.display()))?;
        tracing::debug!(path = %path.display(), brands = config.brands.len(), "Loaded config");
        Ok(config)
    }
}
