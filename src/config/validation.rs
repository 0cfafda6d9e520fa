use super::{AppConfig, ConfigError};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_ops_config(config)?;
    validate_credentials(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|err| validation_err(format!("{field} is not a valid URL: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(validation_err(format!(
            "{field} must use http or https, got '{other}'"
        ))),
    }
}

fn validate_ops_config(config: &AppConfig) -> Result<(), ConfigError> {
    let ops = &config.ops;
    validate_http_url("ops.base_url", &ops.base_url)?;
    validate_http_url("ops.auth_url", &ops.auth_url)?;
    if ops.base_url.ends_with('/') {
        return Err(validation_err(
            "ops.base_url must not end with '/' (endpoints start with '/')",
        ));
    }
    if ops.timeout == 0 {
        return Err(validation_err("ops.timeout must be greater than 0"));
    }
    if ops.connect_timeout == 0 {
        return Err(validation_err("ops.connect_timeout must be greater than 0"));
    }
    if ops.user_agent.trim().is_empty() {
        return Err(validation_err("ops.user_agent cannot be empty"));
    }
    Ok(())
}

fn validate_credentials(config: &AppConfig) -> Result<(), ConfigError> {
    let credentials = &config.credentials;
    if credentials.key_env.trim().is_empty() {
        return Err(validation_err("credentials.key_env cannot be empty"));
    }
    if credentials.secret_env.trim().is_empty() {
        return Err(validation_err("credentials.secret_env cannot be empty"));
    }
    Ok(())
}

const VALID_LOG_LEVELS: &[&str] = &[
    "TRACE", "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL", "DISABLED",
];

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let level = config.features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level '{}' is not one of {}",
            config.features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    Ok(())
}
