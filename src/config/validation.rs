use crate::config::types::{Config, HttpConfig, PortalRule, StoreConfig};
use crate::ConfigError;
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_store_config(&config.store)?;
    for rule in &config.portals {
        validate_portal_rule(rule)?;
    }
    Ok(())
}

/// Validates fetcher configuration
pub fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !config.request_delay_seconds.is_finite() || config.request_delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "request-delay-seconds must be a non-negative number, got {}",
            config.request_delay_seconds
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.enrichment_timeout_cap_seconds < 1 {
        return Err(ConfigError::Validation(
            "enrichment-timeout-cap-seconds must be >= 1".to_string(),
        ));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a portal rule and compiles its homepage pattern
pub fn validate_portal_rule(rule: &PortalRule) -> Result<Regex, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidPortal {
        name: rule.name.clone(),
        message,
    };

    if rule.host_contains.trim().is_empty() {
        return Err(invalid("host-contains cannot be empty".to_string()));
    }

    let pattern = Regex::new(&rule.homepage_pattern)
        .map_err(|e| invalid(format!("homepage-pattern does not compile: {}", e)))?;

    if !pattern.capture_names().any(|name| name == Some("url")) {
        return Err(invalid(
            "homepage-pattern must have a named 'url' group".to_string(),
        ));
    }

    if let Some(path) = &rule.contact_path {
        if !path.starts_with('/') || !path.contains("{id}") {
            return Err(invalid(format!(
                "contact-path must start with '/' and contain {{id}}, got '{}'",
                path
            )));
        }
        if rule.id_params.is_empty() {
            return Err(invalid(
                "contact-path requires at least one id-param".to_string(),
            ));
        }
    }

    Ok(pattern)
}
