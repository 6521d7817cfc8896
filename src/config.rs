//! # Cache Configuration
//!
//! Layered configuration for the handler cache: defaults, an optional config
//! file, then `HANDLER_CACHE_*` environment variables.

use crate::error::{HandlerCacheError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "HANDLER_CACHE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of keys the cache map is pre-sized for
    pub initial_capacity: usize,
    /// Deployment environment, used to pick log verbosity
    pub environment: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            environment: "development".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(capacity) = std::env::var("HANDLER_CACHE_INITIAL_CAPACITY") {
            config.initial_capacity = capacity.parse().map_err(|e| {
                HandlerCacheError::ConfigurationError(format!("Invalid initial_capacity: {e}"))
            })?;
        }

        if let Ok(environment) = std::env::var("HANDLER_CACHE_ENVIRONMENT") {
            config.environment = environment;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional file, overlaid with environment variables
    ///
    /// A missing file is not an error; the defaults apply instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: CacheConfig = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            initial_capacity = config.initial_capacity,
            environment = %config.environment,
            "Cache configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.environment.trim().is_empty() {
            return Err(HandlerCacheError::ConfigurationError(
                "environment cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.environment, "development");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("HANDLER_CACHE_INITIAL_CAPACITY", "64");
        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.initial_capacity, 64);

        std::env::set_var("HANDLER_CACHE_INITIAL_CAPACITY", "many");
        assert!(matches!(
            CacheConfig::from_env(),
            Err(HandlerCacheError::ConfigurationError(_))
        ));
        std::env::remove_var("HANDLER_CACHE_INITIAL_CAPACITY");
    }

    #[test]
    fn test_empty_environment_is_rejected() {
        let config = CacheConfig {
            initial_capacity: 4,
            environment: "  ".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(HandlerCacheError::ConfigurationError(_))
        ));
    }
}
