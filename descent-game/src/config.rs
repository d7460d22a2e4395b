//! Resolver configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_RESOLVER_SEED, DEFAULT_STORAGE_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Storage slot holding the single active encounter.
    #[serde(default = "ResolverConfig::default_storage_key")]
    pub storage_key: String,
    /// Seed for the encounter-id generator.
    #[serde(default = "ResolverConfig::default_seed")]
    pub seed: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            storage_key: Self::default_storage_key(),
            seed: Self::default_seed(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.to_string()
    }

    #[must_use]
    pub const fn default_seed() -> u64 {
        DEFAULT_RESOLVER_SEED
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Parse a config from JSON, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, ResolverConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| ResolverConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ResolverConfigError` when the storage key is unusable.
    pub fn validate(&self) -> Result<(), ResolverConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ResolverConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}

/// Errors raised when resolver configuration is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverConfigError {
    #[error("storage key must not be empty")]
    EmptyStorageKey,
    #[error("resolver config unreadable: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ResolverConfig::default_config();
        assert_eq!(config.storage_key, "descent.active_encounter");
        assert_eq!(config.seed, DEFAULT_RESOLVER_SEED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = ResolverConfig::from_json(r#"{ "seed": 42 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = ResolverConfig::from_json(r#"{ "storage_key": "  " }"#).unwrap_err();
        assert_eq!(err, ResolverConfigError::EmptyStorageKey);
        assert!(matches!(
            ResolverConfig::from_json("not json"),
            Err(ResolverConfigError::Parse(_))
        ));
    }
}
