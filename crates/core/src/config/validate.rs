use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - An API key is set when `auth.method = "api_key"`
/// - Server port is not 0
/// - Session TTL and sweep interval are positive
/// - Conversion limits are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::invalid("auth.api_key is required when auth.method = \"api_key\""));
    }

    if config.server.port == 0 {
        return Err(ConfigError::invalid("server.port cannot be 0"));
    }

    if config.server.session_ttl_secs == 0 {
        return Err(ConfigError::invalid("server.session_ttl_secs must be greater than 0"));
    }

    if config.server.session_sweep_interval_secs == 0 {
        return Err(ConfigError::invalid(
            "server.session_sweep_interval_secs must be greater than 0",
        ));
    }

    if config.conversion.timeout_secs == 0 {
        return Err(ConfigError::invalid("conversion.timeout_secs must be greater than 0"));
    }

    if config.conversion.max_upload_bytes == 0 {
        return Err(ConfigError::invalid("conversion.max_upload_bytes must be greater than 0"));
    }

    if config.audit.enabled && config.audit.buffer_size == 0 {
        return Err(ConfigError::invalid("audit.buffer_size must be greater than 0"));
    }

    Ok(())
}
