//! Configuration validation utilities

use super::ConnectorConfig;
use anyhow::anyhow;
use ghconnect_http::Url;

/// Enumeration of possible validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// API base URL does not parse
    InvalidApiBase(String),
    /// API base URL uses a scheme other than http/https
    UnsupportedApiScheme(String),
    /// Request timeout is zero
    ZeroTimeout,
    /// Cache is enabled but has no room
    ZeroCacheSize,
    /// User agent is empty or whitespace-only
    EmptyUserAgent,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidApiBase(url) => {
                write!(f, "api_base is not a valid URL: '{}'", url)
            }
            ValidationError::UnsupportedApiScheme(url) => {
                write!(f, "api_base must use http or https: '{}'", url)
            }
            ValidationError::ZeroTimeout => write!(f, "timeout_secs must be greater than 0"),
            ValidationError::ZeroCacheSize => {
                write!(f, "cache.max_size_bytes must be greater than 0 when the cache is enabled")
            }
            ValidationError::EmptyUserAgent => write!(f, "user_agent cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a loaded configuration, collecting every problem found
pub fn validate_config(config: &ConnectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api_base) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::UnsupportedApiScheme(config.api_base.clone()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidApiBase(config.api_base.clone())),
    }

    if config.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.cache.enabled && config.cache.max_size_bytes == 0 {
        errors.push(ValidationError::ZeroCacheSize);
    }

    if config.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert validation errors into a single anyhow error
pub fn validation_errors_to_anyhow(errors: Vec<ValidationError>) -> anyhow::Error {
    let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    anyhow!("Validation errors: {}", error_messages.join("; "))
}
