//! Configuration file loading and saving

use super::validation;
use crate::connector::CachingConnector;
use crate::constants;
use anyhow::{Context, Result};
use ghconnect_http::{HttpClient, ResponseCache, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_bytes: constants::config::DEFAULT_CACHE_SIZE_BYTES,
        }
    }
}

/// Settings for building the HTTP client and connector
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub api_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` from the environment
    pub use_proxy: bool,
    /// Forced `max-age` in seconds; negative disables the forced header
    pub cache_max_age: i32,
    pub cache: CacheConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_base: constants::github::API_BASE.to_string(),
            user_agent: constants::github::DEFAULT_USER_AGENT.to_string(),
            timeout_secs: constants::config::DEFAULT_TIMEOUT_SECS,
            use_proxy: true,
            cache_max_age: constants::config::DEFAULT_CACHE_MAX_AGE,
            cache: CacheConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;

        let config: ConnectorConfig = if content.trim().is_empty() {
            ConnectorConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file '{}'", path))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, format!("---\n{}", yaml))
            .with_context(|| format!("Failed to write config file '{}'", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self).map_err(validation::validation_errors_to_anyhow)
    }

    /// Build the caller-side HTTP client: cache per config, default specs
    pub fn build_client(&self) -> Result<HttpClient> {
        let mut builder = HttpClient::builder()
            .user_agent(self.user_agent.clone())
            .timeout(Duration::from_secs(self.timeout_secs));
        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        if self.cache.enabled {
            builder = builder.cache(ResponseCache::new(self.cache.max_size_bytes));
        }
        builder.build()
    }

    /// Build a caching connector over [`ConnectorConfig::build_client`]
    pub fn build_connector(&self) -> Result<CachingConnector> {
        CachingConnector::with_max_age(&self.build_client()?, self.cache_max_age)
    }

    /// Resolve `target` to a URL: absolute URLs pass through, paths join `api_base`
    pub fn resolve_url(&self, target: &str) -> Result<Url> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Url::parse(target).with_context(|| format!("Invalid URL '{}'", target));
        }
        let joined = format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            target.trim_start_matches('/')
        );
        Url::parse(&joined).with_context(|| format!("Invalid URL '{}'", joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.cache_max_age, 0);
        assert!(config.cache.enabled);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ConnectorConfig = serde_yaml::from_str("cache_max_age: 60\n").unwrap();
        assert_eq!(config.cache_max_age, 60);
        assert_eq!(config.api_base, "https://api.github.com");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_resolve_url() {
        let config = ConnectorConfig::default();
        assert_eq!(
            config.resolve_url("/repos/o/r").unwrap().as_str(),
            "https://api.github.com/repos/o/r"
        );
        assert_eq!(
            config.resolve_url("rate_limit").unwrap().as_str(),
            "https://api.github.com/rate_limit"
        );
        assert_eq!(
            config.resolve_url("http://localhost:8080/x").unwrap().as_str(),
            "http://localhost:8080/x"
        );
    }

    #[test]
    fn test_build_client_respects_cache_setting() {
        let mut config = ConnectorConfig::default();
        assert!(config.build_client().unwrap().cache().is_some());

        config.cache.enabled = false;
        assert!(config.build_client().unwrap().cache().is_none());
    }

    #[test]
    fn test_build_connector_uses_configured_max_age() {
        let mut config = ConnectorConfig::default();
        config.cache_max_age = 120;
        let connector = config.build_connector().unwrap();
        assert_eq!(connector.max_age_header_value(), Some("max-age=120"));

        config.cache_max_age = -1;
        let connector = config.build_connector().unwrap();
        assert_eq!(connector.max_age_header_value(), None);
    }
}
