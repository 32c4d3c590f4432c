use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "FORMATSHIFT_";

/// TOML file first, environment on top. Nested keys use `__`, so
/// `FORMATSHIFT_CONVERSION__TIMEOUT_SECS=60` sets `conversion.timeout_secs`.
fn layered(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from `path` with environment overrides applied.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    Ok(layered(path).extract()?)
}

/// Parse configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(toml_str)?)
}
