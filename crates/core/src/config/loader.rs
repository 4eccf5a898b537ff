use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WSYNC_").split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment_for(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration, falling back to defaults (plus environment) when the
/// file does not exist.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    figment_for(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
