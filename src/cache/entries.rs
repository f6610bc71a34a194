//! The five atomic cache operations.
//!
//! Each operation is a single SQL statement executed on the connection's
//! worker thread, so SQLite's per-statement transaction provides atomicity
//! relative to concurrent callers: last-committed-write-wins for upserts,
//! no partial state observable by readers. Expiry is evaluated at read
//! time; physical removal of expired rows is `purge_expired`'s job alone.
//!
//! Timestamps are RFC 3339 UTC strings. Strings in that format compare
//! lexically in timestamp order, and `julianday` parses them for the
//! stats arithmetic.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::error::Error;

/// Cache statistics as of a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: u64,
    /// Rows whose expiry has passed but which have not been swept yet.
    pub expired_entries: u64,
    pub active_entries: u64,
    /// Mean of (expires_at - created_at) in seconds over rows with a TTL;
    /// 0.0 when no row carries one.
    pub avg_ttl_seconds: f64,
}

impl CacheDb {
    /// Insert or replace the entry under `key`.
    ///
    /// A `ttl_seconds` of None means the entry never expires. Uses UPSERT
    /// semantics: value, expiry, and `updated_at` are replaced wholesale
    /// on conflict; `created_at` is preserved from the first insert.
    pub async fn upsert_entry(&self, key: &str, payload: String, ttl_seconds: Option<i64>) -> Result<(), Error> {
        let key = key.to_string();
        let now = Utc::now();
        let expires_at = ttl_seconds.map(|s| (now + Duration::seconds(s)).to_rfc3339());
        let now = now.to_rfc3339();
        let sql = format!(
            "INSERT INTO {table} (key, value, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at",
            table = self.table,
        );

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(&sql, params![key, payload, expires_at, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Fetch the payload under `key` if the entry exists and has not expired.
    ///
    /// Expired rows are reported as absent but left in place, keeping
    /// reads side-effect-free.
    pub async fn get_entry(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "SELECT value FROM {table}
             WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            table = self.table,
        );

        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let result = stmt.query_row(params![key, now], |row| row.get(0));
                match result {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry under `key` if physically present.
    ///
    /// Returns true only when the removed row was still live. An expired
    /// row is swept as a side effect but reported as false, matching what
    /// a reader would have observed. Idempotent.
    pub async fn delete_entry(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        let now = Utc::now().to_rfc3339();
        let sql = format!("DELETE FROM {table} WHERE key = ?1 RETURNING expires_at", table = self.table);

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let result = stmt.query_row(params![key], |row| row.get::<_, Option<String>>(0));
                match result {
                    Ok(None) => Ok(true),
                    Ok(Some(expires_at)) => Ok(expires_at > now),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove every expired entry; returns the number removed.
    ///
    /// The expiry check and the delete are one statement, so a row
    /// refreshed by a concurrent upsert can never be removed with a stale
    /// timestamp.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "DELETE FROM {table} WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            table = self.table,
        );

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(&sql, params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Aggregate row counts and mean TTL as of call time.
    ///
    /// Rows without a TTL are excluded from the average; the average is
    /// 0.0 when no row carries one.
    pub async fn entry_stats(&self) -> Result<CacheStats, Error> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "SELECT
                 COUNT(*),
                 SUM(CASE WHEN expires_at IS NOT NULL AND expires_at <= ?1 THEN 1 ELSE 0 END),
                 AVG(CASE WHEN expires_at IS NOT NULL
                     THEN (julianday(expires_at) - julianday(created_at)) * 86400.0 END)
             FROM {table}",
            table = self.table,
        );

        self.conn
            .call(move |conn| -> Result<CacheStats, Error> {
                let (total, expired, avg) = conn
                    .query_row(&sql, params![now], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                            row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        ))
                    })
                    .map_err(Error::from)?;

                Ok(CacheStats {
                    total_entries: total as u64,
                    expired_entries: expired as u64,
                    active_entries: (total - expired) as u64,
                    avg_ttl_seconds: avg,
                })
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    async fn open_db() -> CacheDb {
        CacheDb::open_in_memory(&CacheConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = open_db().await;
        db.upsert_entry("k", "\"hello\"".into(), None).await.unwrap();
        let payload = db.get_entry("k").await.unwrap().unwrap();
        assert_eq!(payload, "\"hello\"");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = open_db().await;
        assert!(db.get_entry("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_wholesale() {
        let db = open_db().await;
        db.upsert_entry("k", "\"v1\"".into(), Some(3600)).await.unwrap();
        db.upsert_entry("k", "\"v2\"".into(), None).await.unwrap();
        assert_eq!(db.get_entry("k").await.unwrap().unwrap(), "\"v2\"");

        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let db = open_db().await;
        db.upsert_entry("short", "\"v\"".into(), Some(1)).await.unwrap();
        assert!(db.get_entry("short").await.unwrap().is_some());

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
        assert!(db.get_entry("short").await.unwrap().is_none());

        // Expired but not yet swept: the row is still physically present.
        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);
    }

    #[tokio::test]
    async fn test_delete_semantics() {
        let db = open_db().await;
        assert!(!db.delete_entry("never-set").await.unwrap());

        db.upsert_entry("live", "\"v\"".into(), None).await.unwrap();
        assert!(db.delete_entry("live").await.unwrap());
        assert!(db.get_entry("live").await.unwrap().is_none());
        assert!(!db.delete_entry("live").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_sweeps_but_reports_false() {
        let db = open_db().await;
        db.upsert_entry("stale", "\"v\"".into(), Some(1)).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert!(!db.delete_entry("stale").await.unwrap());

        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = open_db().await;
        db.upsert_entry("a", "\"1\"".into(), Some(1)).await.unwrap();
        db.upsert_entry("b", "\"2\"".into(), Some(1)).await.unwrap();
        db.upsert_entry("c", "\"3\"".into(), Some(3600)).await.unwrap();
        db.upsert_entry("d", "\"4\"".into(), None).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        let removed = db.purge_expired().await.unwrap();
        assert_eq!(removed, 2);

        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.active_entries, 2);
        assert!(db.get_entry("c").await.unwrap().is_some());
        assert!(db.get_entry("d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_is_repeatable() {
        let db = open_db().await;
        assert_eq!(db.purge_expired().await.unwrap(), 0);
        assert_eq!(db.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats_empty_table() {
        let db = open_db().await;
        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.active_entries, 0);
        assert_eq!(stats.avg_ttl_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_stats_avg_ttl_excludes_permanent_entries() {
        let db = open_db().await;
        db.upsert_entry("t100", "\"v\"".into(), Some(100)).await.unwrap();
        db.upsert_entry("t200", "\"v\"".into(), Some(200)).await.unwrap();
        db.upsert_entry("perm", "\"v\"".into(), None).await.unwrap();

        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.active_entries, 3);
        // Mean of 100 and 200, within timestamp-rounding tolerance.
        assert!((stats.avg_ttl_seconds - 150.0).abs() < 1.0, "avg was {}", stats.avg_ttl_seconds);
    }

    #[tokio::test]
    async fn test_stats_avg_ttl_sentinel_without_ttls() {
        let db = open_db().await;
        db.upsert_entry("perm", "\"v\"".into(), None).await.unwrap();

        let stats = db.entry_stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.avg_ttl_seconds, 0.0);
    }
}
