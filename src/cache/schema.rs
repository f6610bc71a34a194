//! Idempotent schema bootstrap.
//!
//! Ensures the cache table and its expiry index exist. Safe to run on every
//! process startup; running it N times leaves the same end state as running
//! it once, and existing rows are never touched. All statements use
//! CREATE IF NOT EXISTS.

use crate::config::CacheConfig;
use crate::error::Error;
use tokio_rusqlite::{Connection, rusqlite};

/// Schema-qualified, quoted table reference used by every statement.
pub(crate) fn qualified_table(config: &CacheConfig) -> String {
    format!("\"{}\".\"{}\"", config.schema, config.table_name)
}

/// Create the cache table and expiry index if they do not exist.
///
/// Identifiers come from validated configuration, so they can be spliced
/// into the DDL directly. Failure is fatal: the cache refuses to construct
/// against a missing or partial schema.
///
/// # Errors
///
/// Returns `Error::Bootstrap` if any DDL statement fails.
pub(crate) async fn ensure(conn: &Connection, config: &CacheConfig) -> Result<(), Error> {
    let table = qualified_table(config);
    let mut ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            expires_at  TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );"
    );

    // Partial index: cleanup and stats only ever scan rows with a TTL.
    if config.create_indexes {
        ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS \"{schema}\".\"{name}_expires_at_idx\"
                 ON \"{name}\" (expires_at) WHERE expires_at IS NOT NULL;",
            schema = config.schema,
            name = config.table_name,
        ));
    }

    conn.call(move |conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch(&ddl)?;
        Ok(())
    })
    .await
    .map_err(|e| Error::Bootstrap(e.to_string()))?;

    tracing::info!(table = %config.table_name, schema = %config.schema, "cache table ensured");
    Ok(())
}
