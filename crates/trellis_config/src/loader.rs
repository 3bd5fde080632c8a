//! Reading `trellis.toml` and checking it before use.

use crate::error::ConfigError;
use crate::types::EngineConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Loads `<project_dir>/trellis.toml`.
pub fn load_config(project_dir: &Path) -> Result<EngineConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads a configuration file that may have any name.
pub fn load_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses configuration text and checks it.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.cache.enabled && config.cache.fast_tier_entries == 0 {
        return Err(ConfigError::ValidationError(
            "cache.fast_tier_entries must be at least 1 when the cache is enabled".to_string(),
        ));
    }
    for (name, layout) in &config.layouts {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "layout names must not be empty".to_string(),
            ));
        }
        if layout.source.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("layouts.{name}.source")));
        }
        if layout
            .dev_source
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(format!(
                "layouts.{name}.dev_source must not be empty when given"
            )));
        }
    }
    Ok(())
}
