//! Embedded migrations.

use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::db::connection::connect_sqlite;
use crate::store::{StoreError, StoreResult};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply all pending migrations on an open connection. Returns how many ran.
pub fn run_pending(conn: &mut SqliteConnection) -> StoreResult<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Migration(e.to_string()))?;
    for m in &applied {
        tracing::info!(migration = %m, "applied migration");
    }
    Ok(applied.len())
}

/// Open the database at `url` (see [`connect_sqlite`]) and bring its schema up to date.
pub fn run_sqlite(url: &str) -> StoreResult<usize> {
    let mut conn = connect_sqlite(url)?;
    run_pending(&mut conn)
}
