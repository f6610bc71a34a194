//! Cache configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SQLKV_*)
//! 2. TOML config file (if SQLKV_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Cache configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SQLKV_*)
/// 2. TOML config file (if SQLKV_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is enabled. When false, no cache is constructed.
    ///
    /// Set via SQLKV_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database file.
    ///
    /// Set via SQLKV_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name of the cache table.
    ///
    /// Set via SQLKV_TABLE_NAME environment variable.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Database schema the cache table lives in.
    ///
    /// Set via SQLKV_SCHEMA environment variable. "main" unless the caller
    /// has attached another database under a different name.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Default time-to-live in seconds, used by `set_with_default_ttl`.
    ///
    /// Set via SQLKV_DEFAULT_TTL_SECONDS environment variable.
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Whether to create the expiry index during bootstrap.
    ///
    /// Set via SQLKV_CREATE_INDEXES environment variable.
    #[serde(default = "default_true")]
    pub create_indexes: bool,

    /// Skip fsync (PRAGMA synchronous=OFF) for write throughput at the
    /// cost of durability across crashes.
    ///
    /// Set via SQLKV_RELAXED_DURABILITY environment variable.
    #[serde(default = "default_true")]
    pub relaxed_durability: bool,
}

fn default_true() -> bool {
    true
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./kv-cache.sqlite")
}

fn default_table_name() -> String {
    "kv_cache".into()
}

fn default_schema() -> String {
    "main".into()
}

fn default_ttl_seconds() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: default_db_path(),
            table_name: default_table_name(),
            schema: default_schema(),
            default_ttl_seconds: default_ttl_seconds(),
            create_indexes: true,
            relaxed_durability: true,
        }
    }
}

impl CacheConfig {
    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SQLKV_`
    /// 2. TOML file from `SQLKV_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SQLKV_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SQLKV_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
