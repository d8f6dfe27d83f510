//! Pooled SQLite connections

use crate::config::DatabaseConfig;
use crate::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;

/// Database connection pool type
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Open a pool over the configured database file and create the schema
pub fn open_pool(config: &DatabaseConfig) -> Result<DbPool> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(
        path = %config.path.display(),
        pool_size = config.pool_size,
        "Opening mail database"
    );

    let busy_timeout = config.busy_timeout();
    let wal_mode = config.wal_mode;
    let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        if wal_mode {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
        }
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(config.pool_size.max(1))
        .build(manager)?;

    let conn = pool.get()?;
    super::schema::init_schema(&conn)?;
    drop(conn);
    Ok(pool)
}

/// Open a single-connection pool over a private in-memory database
///
/// Every in-memory connection is its own database, so the pool is capped at
/// one connection that is never recycled. Callers must not hold a connection
/// while asking for another.
pub fn open_in_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)?;

    let conn = pool.get()?;
    super::schema::init_schema(&conn)?;
    drop(conn);
    Ok(pool)
}
