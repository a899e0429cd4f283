//! Record store abstraction.
//!
//! The engine never walks storage itself; it asks a [`RecordStore`] four
//! independent questions and merges the answers:
//! - count + revenue inside a [`Window`]
//! - count + cash grouped by raw status label (with one record id per label)
//! - count + revenue grouped by local calendar day inside a window
//! - the newest orders
//!
//! Implementations:
//! - [`memory::MemoryStore`]: an in-memory snapshot, used by tests and the `import --dry-run` path.
//! - [`sqlite::SqliteStore`]: Diesel/SQLite, blocking queries moved onto tokio's blocking pool.
//!
//! The grouping helpers below are shared so both stores agree on what a "day" and a
//! "status group" mean.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{
    record::{DayGroup, RecentOrder, StatusGroup, SumOverflow, Totals, checked_sum},
    tz,
    window::Window,
};

/// Errors that can occur while reading from or writing to a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not open the database.
    #[error("connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    /// A query failed (busy/locked database, I/O, constraint...).
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// Pending migrations could not be applied.
    #[error("migration failed: {0}")]
    Migration(String),

    /// The blocking worker running a query panicked or was cancelled.
    #[error("store worker failed: {0}")]
    Worker(String),

    /// A stored row could not be decoded (bad timestamp or price text).
    #[error("corrupt row {id}: {reason}")]
    CorruptRow {
        /// Primary key of the offending row.
        id: String,
        /// What could not be decoded.
        reason: String,
    },

    /// An update targeted an order that does not exist.
    #[error("order not found: {0}")]
    NotFound(String),

    /// A write was rejected before reaching storage.
    #[error("invalid order: {0}")]
    Invalid(String),

    /// Stored prices sum past the representable range.
    #[error("revenue sum out of range")]
    Overflow(#[from] SumOverflow),
}

impl StoreError {
    /// Whether retrying the same call later can reasonably succeed.
    ///
    /// Transient conditions (connection loss, SQLITE_BUSY, worker hiccups) are
    /// retryable; corrupt data, missing rows and rejected writes are not.
    pub fn is_retryable(&self) -> bool {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        match self {
            StoreError::Connection(_) | StoreError::Worker(_) => true,
            StoreError::Query(DieselError::DatabaseError(kind, _)) => !matches!(
                kind,
                DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::ForeignKeyViolation
                    | DatabaseErrorKind::NotNullViolation
                    | DatabaseErrorKind::CheckViolation
            ),
            StoreError::Query(DieselError::NotFound) => false,
            StoreError::Query(_) => true,
            StoreError::Migration(_)
            | StoreError::CorruptRow { .. }
            | StoreError::NotFound(_)
            | StoreError::Invalid(_)
            | StoreError::Overflow(_) => false,
        }
    }
}

/// Result type used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read surface the analytics engine depends on.
///
/// Each method is a self-contained read; the engine may run them concurrently and
/// assumes nothing about their relative ordering.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Count and revenue of orders whose `created_at` lies in `window` (inclusive).
    async fn window_totals(&self, window: Window) -> StoreResult<Totals>;

    /// Count and cash per raw status label over all orders, unfiltered.
    async fn status_groups(&self) -> StoreResult<Vec<StatusGroup>>;

    /// Count and revenue per local calendar day in `tz`, restricted to `window`.
    ///
    /// Days without orders are simply absent.
    async fn daily_groups(&self, window: Window, tz: Tz) -> StoreResult<Vec<DayGroup>>;

    /// Up to `limit` orders, newest `created_at` first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<RecentOrder>>;
}

/// Group `(id, status, price)` rows by raw label, first-seen order.
pub(crate) fn group_by_status<'a>(
    rows: impl IntoIterator<Item = (&'a str, &'a str, Decimal)>,
) -> StoreResult<Vec<StatusGroup>> {
    let mut groups: IndexMap<&'a str, StatusGroup> = IndexMap::new();
    for (id, status, price) in rows {
        let g = groups.entry(status).or_insert_with(|| StatusGroup {
            status: status.to_string(),
            count: 0,
            cash_sum: Decimal::ZERO,
            sample_id: id.to_string(),
        });
        g.cash_sum = checked_sum(g.cash_sum, price)?;
        g.count += 1;
    }
    Ok(groups.into_values().collect())
}

/// Group `(created_at, price)` rows inside `window` by local date, ascending.
pub(crate) fn group_by_local_day(
    rows: impl IntoIterator<Item = (DateTime<Utc>, Decimal)>,
    window: Window,
    tz: Tz,
) -> StoreResult<Vec<DayGroup>> {
    let mut days = BTreeMap::new();
    for (created_at, price) in rows {
        if !window.contains(created_at) {
            continue;
        }
        days.entry(tz::local_date(created_at, tz))
            .or_insert_with(Totals::default)
            .add(price)?;
    }
    Ok(days
        .into_iter()
        .map(|(date, totals)| DayGroup { date, totals })
        .collect())
}
