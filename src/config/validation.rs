//! Configuration validation rules.
//!
//! This module provides validation logic for `CacheConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::CacheConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Bare SQL identifier: letter or underscore, then letters, digits,
/// underscores. Table and schema names are spliced into SQL text, so
/// anything else is rejected here.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl CacheConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `table_name` or `schema` is not a bare SQL identifier
    /// - `default_ttl_seconds` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.table_name) {
            return Err(ConfigError::Invalid {
                field: "table_name".into(),
                reason: "must be a bare SQL identifier".into(),
            });
        }

        if !is_identifier(&self.schema) {
            return Err(ConfigError::Invalid {
                field: "schema".into(),
                reason: "must be a bare SQL identifier".into(),
            });
        }

        if self.default_ttl_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "default_ttl_seconds".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        if !self.enabled {
            tracing::warn!("cache is disabled; no cache will be constructed from this configuration");
        }

        Ok(())
    }
}
