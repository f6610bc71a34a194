//! SQLite-backed key-value cache with TTL expiry.
//!
//! This module provides a persistent, shareable cache using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Atomic upsert with optional per-entry TTL
//! - Expiry evaluated at read time, with side-effect-free gets
//! - Single-statement cleanup of expired rows
//! - On-demand statistics
//! - WAL mode for concurrent access

pub mod codec;
pub mod connection;
pub mod entries;
pub mod schema;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::CacheConfig;
use crate::error::Error;

pub use connection::CacheDb;
pub use entries::CacheStats;

/// Typed cache facade.
///
/// Serializes values to the canonical JSON payload, invokes the atomic
/// cache operations, and deserializes results. Holds no in-process cache
/// state beyond the database handle and the configured default TTL, so it
/// is cheap to clone and safe to share across tasks.
#[derive(Clone, Debug)]
pub struct Cache {
    db: CacheDb,
    default_ttl: Duration,
}

impl Cache {
    /// Open the cache described by `config`.
    ///
    /// Validates the configuration and runs the schema bootstrap before
    /// returning; a bootstrap failure is fatal and no `Cache` is
    /// constructed. Returns `Error::Disabled` when the configuration
    /// disables the cache.
    pub async fn open(config: &CacheConfig) -> Result<Self, Error> {
        if !config.enabled {
            return Err(Error::Disabled);
        }
        config.validate().map_err(|e| Error::Bootstrap(e.to_string()))?;
        let db = CacheDb::open(config).await?;
        Ok(Self { db, default_ttl: config.default_ttl() })
    }

    /// Open an in-memory cache for testing.
    pub async fn open_in_memory(config: &CacheConfig) -> Result<Self, Error> {
        if !config.enabled {
            return Err(Error::Disabled);
        }
        config.validate().map_err(|e| Error::Bootstrap(e.to_string()))?;
        let db = CacheDb::open_in_memory(config).await?;
        Ok(Self { db, default_ttl: config.default_ttl() })
    }

    /// Store a value under `key`.
    ///
    /// A `ttl` of None means the entry never expires. An existing entry is
    /// overwritten wholesale; concurrent writers to the same key serialize
    /// with last-committed-write-wins. On error, callers must treat the
    /// write outcome as unknown.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<(), Error> {
        let payload = codec::encode(key, value)?;
        let ttl_seconds = ttl.map(|d| d.as_secs() as i64);
        self.db
            .upsert_entry(key, payload, ttl_seconds)
            .await
            .map_err(|e| e.into_operation("set", Some(key)))
    }

    /// Store a value under `key` using the configured default TTL.
    pub async fn set_with_default_ttl<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        self.set(key, value, Some(self.default_ttl)).await
    }

    /// Fetch the value under `key`, if present and not expired.
    ///
    /// `None` covers both "never set" and "expired but not yet swept";
    /// callers cannot distinguish the two. Expired rows are left in place
    /// for `cleanup`, keeping reads side-effect-free.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        let payload = self
            .db
            .get_entry(key)
            .await
            .map_err(|e| e.into_operation("get", Some(key)))?;

        match payload {
            Some(payload) => {
                tracing::debug!("cache hit for key {key}");
                codec::decode(key, &payload).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Remove the entry under `key`.
    ///
    /// Returns true only if a live entry was removed; false for a key that
    /// was absent or already expired. Idempotent.
    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        self.db
            .delete_entry(key)
            .await
            .map_err(|e| e.into_operation("delete", Some(key)))
    }

    /// Remove every expired entry; returns the number removed.
    pub async fn cleanup(&self) -> Result<u64, Error> {
        let removed = self
            .db
            .purge_expired()
            .await
            .map_err(|e| e.into_operation("cleanup", None))?;
        tracing::debug!("cleanup removed {removed} expired entries");
        Ok(removed)
    }

    /// Snapshot of cache statistics as of call time.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        self.db
            .entry_stats()
            .await
            .map_err(|e| e.into_operation("stats", None))
    }
}
