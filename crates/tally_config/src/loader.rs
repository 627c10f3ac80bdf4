//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::TallyConfig;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "tally.toml";

/// Loads and validates `tally.toml` from a project directory.
///
/// A project without a configuration file uses the defaults.
pub fn load_config(project_dir: &Path) -> Result<TallyConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(TallyConfig::default()),
        Err(err) => return Err(err.into()),
    };
    load_config_from_str(&content)
}

/// Parses and validates a `tally.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<TallyConfig, ConfigError> {
    let config: TallyConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &TallyConfig) -> Result<(), ConfigError> {
    if config.store.dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("store.dir".to_string()));
    }
    if config.store.file.is_empty() {
        return Err(ConfigError::MissingField("store.file".to_string()));
    }
    Ok(())
}
