use std::fs;
use std::path::Path;

use vigil_core::EngineConfig;

use crate::error::{Result, StoreError};

/// Read an engine configuration from `.toml` or `.json` and validate it.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content)?,
        Some("json") => parse_json(&content)?,
        other => {
            return Err(StoreError::Config(format!(
                "unsupported config format {other:?} for {} (expected .toml or .json)",
                path.display()
            )));
        }
    };
    tracing::debug!("loaded config '{}' from {}", config.name, path.display());
    Ok(config)
}

pub fn parse_toml(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn parse_json(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig =
        serde_json::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Render a configuration as TOML, in the same shape `load_config` reads.
pub fn to_toml(config: &EngineConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| StoreError::Config(e.to_string()))
}
