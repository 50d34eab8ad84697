use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("REELSORT_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// Environment overrides still apply in the fallback case.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    info!("No config file at {}, using defaults", path.display());
    Figment::new()
        .merge(Env::prefixed("REELSORT_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string (useful for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
