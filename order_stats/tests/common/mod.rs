#![allow(dead_code)]

use chrono::{DateTime, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use order_stats::{
    db::{connection, migrate},
    models::NewOrder,
    store::sqlite::SqliteStore,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/orders.db
}

impl TestDb {
    pub fn connect(&self) -> SqliteConnection {
        connection::connect_sqlite(&self.path).expect("connect")
    }
}

/// Migrated temp database plus a store over its own connection.
pub fn setup_store() -> (TestDb, SqliteStore) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("orders.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_sqlite(&path).expect("migrations");
    let store = SqliteStore::from_connection(connection::connect_sqlite(&path).expect("connect"));
    (TestDb { _dir: dir, path }, store)
}

pub fn order(id: &str, cents: i64, status: &str, at: DateTime<Utc>) -> NewOrder {
    NewOrder {
        id: id.into(),
        price: Decimal::new(cents, 2),
        status: Some(status.into()),
        created_at: at,
    }
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}
