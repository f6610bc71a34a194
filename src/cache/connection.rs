//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode, synchronous level per the
//! durability setting), and running the schema bootstrap.

use super::schema;
use crate::config::CacheConfig;
use crate::error::Error;
use tokio_rusqlite::Connection;

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread, plus the schema-qualified table reference every
/// operation targets.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    pub(crate) table: String,
}

impl CacheDb {
    /// Open a database at the configured path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and ensures
    /// the cache schema exists.
    pub async fn open(config: &CacheConfig) -> Result<Self, Error> {
        let conn = Connection::open(&config.db_path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, config).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same pragma
    /// configuration and schema bootstrap as file-based databases.
    pub async fn open_in_memory(config: &CacheConfig) -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, config).await
    }

    async fn init(conn: Connection, config: &CacheConfig) -> Result<Self, Error> {
        let synchronous = if config.relaxed_durability { "OFF" } else { "NORMAL" };
        let pragmas = format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous={synchronous};
             PRAGMA temp_store=MEMORY;"
        );

        conn.call(move |conn| {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        schema::ensure(&conn, config).await?;

        Ok(Self { conn, table: schema::qualified_table(config) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory(&CacheConfig::default()).await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_table_reference_is_schema_qualified() {
        let db = CacheDb::open_in_memory(&CacheConfig::default()).await.unwrap();
        assert_eq!(db.table, "\"main\".\"kv_cache\"");
    }
}
