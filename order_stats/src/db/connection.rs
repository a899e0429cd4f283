//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies recommended PRAGMAs:
//! WAL journaling, foreign_keys=ON, and a 5000ms busy_timeout.
//!
//! Accepted URLs: a bare path, `sqlite://path`, `sqlite:path`, or `:memory:`.

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

use crate::store::{StoreError, StoreResult};

/// Strip an optional `sqlite:` / `sqlite://` scheme; reject other schemes.
pub fn sqlite_path(database_url: &str) -> StoreResult<&str> {
    let url = database_url.trim();
    if let Some(rest) = url.strip_prefix("sqlite://") {
        return Ok(rest);
    }
    if let Some(rest) = url.strip_prefix("sqlite:") {
        return Ok(rest);
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") || url.starts_with("mysql://") {
        return Err(StoreError::Invalid(format!("unsupported DATABASE_URL: {url}")));
    }
    Ok(url)
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> StoreResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(sqlite_path(database_url)?)?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
