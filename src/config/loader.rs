//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EdgeConfig = toml::from_str(&content)?;
    finish(config)
}

/// Default configuration with environment overrides, validated.
pub fn load_default() -> Result<EdgeConfig, ConfigError> {
    finish(EdgeConfig::default())
}

fn finish(mut config: EdgeConfig) -> Result<EdgeConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay CMS credentials and environment name from variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut EdgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(guid) = get("AGILITY_GUID") {
        config.cms.guid = guid;
    }
    if let Some(key) = get("AGILITY_API_FETCH_KEY") {
        config.cms.fetch_api_key = key;
    }
    if let Some(key) = get("AGILITY_API_PREVIEW_KEY") {
        config.cms.preview_api_key = key;
    }
    if let Some(env) = get("NODE_ENV") {
        config.cms.environment = env;
    }
}
