//! SQLite implementation of [`RecordStore`], plus the write side used by the CLI.
//!
//! Diesel is synchronous, so every call hops onto tokio's blocking pool and takes the
//! single connection behind a mutex. Reads issued concurrently by the engine therefore
//! serialize on the connection, which is fine for a local WAL database.
//!
//! Timestamps compare as text: every row is written through [`tz::to_rfc3339_millis`],
//! whose fixed-width `Z` format sorts chronologically. Any other spelling, even a valid
//! RFC3339 instant with an offset, is reported as [`StoreError::CorruptRow`]. Prices are summed in Rust as
//! [`Decimal`], never with SQL `SUM` (which would go through floating point).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::{
    db::{connection::connect_sqlite, migrate},
    models::{NewOrder, NewOrderRow, OrderRow, decode_price, decode_ts},
    record::{DayGroup, OrderRecord, RecentOrder, StatusGroup, Totals},
    schema::orders::dsl as o,
    status::OrderStatus,
    store::{RecordStore, StoreError, StoreResult, group_by_local_day, group_by_status},
    tz,
    window::Window,
};

/// Cap on rows returned by [`SqliteStore::orders_on_day`].
pub const DAY_LIST_LIMIT: i64 = 100;

/// Record store backed by one SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteStore {
    /// Open `database_url` and apply pending migrations.
    pub fn open(database_url: &str) -> StoreResult<Self> {
        let mut conn = connect_sqlite(database_url)?;
        migrate::run_pending(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-migrated connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Worker("connection mutex poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }

    /// Insert one order. Its status is validated and stored under its canonical label.
    pub async fn insert_order(&self, order: NewOrder) -> StoreResult<()> {
        self.insert_many(vec![order]).await.map(|_| ())
    }

    /// Insert several orders in one immediate transaction; all or nothing.
    pub async fn insert_many(&self, orders: Vec<NewOrder>) -> StoreResult<usize> {
        let mut prepared = Vec::with_capacity(orders.len());
        for order in &orders {
            let status = order.validate()?;
            prepared.push((
                order.id.clone(),
                order.price.to_string(),
                status,
                tz::to_rfc3339_millis(order.created_at),
            ));
        }
        self.with_conn(move |conn| {
            conn.immediate_transaction::<_, StoreError, _>(|conn| {
                let mut n = 0;
                for (id, price, status, created) in &prepared {
                    n += diesel::insert_into(o::orders)
                        .values(NewOrderRow {
                            id,
                            price,
                            status: status.as_str(),
                            created_at: created,
                            updated_at: created,
                        })
                        .execute(conn)?;
                }
                Ok(n)
            })
        })
        .await
    }

    /// Move an order to a new status, stamping `updated_at`. `created_at` never changes.
    pub async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let id = id.to_string();
        let updated = tz::to_rfc3339_millis(at);
        self.with_conn(move |conn| {
            let n = diesel::update(o::orders.find(&id))
                .set((o::status.eq(status.as_str()), o::updated_at.eq(&updated)))
                .execute(conn)?;
            if n == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    /// Remove an order. It disappears from every window and category.
    pub async fn delete_order(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let n = diesel::delete(o::orders.find(&id)).execute(conn)?;
            if n == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    /// Fetch one order by id.
    pub async fn get(&self, id: &str) -> StoreResult<Option<OrderRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            o::orders
                .find(&id)
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?
                .map(OrderRow::into_record)
                .transpose()
        })
        .await
    }

    /// Orders created on one local calendar day, newest first, at most [`DAY_LIST_LIMIT`].
    pub async fn orders_on_day(&self, date: NaiveDate, zone: Tz) -> StoreResult<Vec<OrderRecord>> {
        let invalid = |e: tz::TzError| StoreError::Invalid(e.to_string());
        let next = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| StoreError::Invalid(format!("date out of range: {date}")))?;
        let start = tz::local_midnight(date, zone).map_err(invalid)?;
        let end = tz::local_midnight(next, zone).map_err(invalid)? - Duration::milliseconds(1);
        let (lo, hi) = (tz::to_rfc3339_millis(start), tz::to_rfc3339_millis(end));

        self.with_conn(move |conn| {
            let rows: Vec<OrderRow> = o::orders
                .filter(o::created_at.ge(&lo).and(o::created_at.le(&hi)))
                .order((o::created_at.desc(), o::id.desc()))
                .limit(DAY_LIST_LIMIT)
                .select(OrderRow::as_select())
                .load(conn)?;
            rows.into_iter().map(OrderRow::into_record).collect()
        })
        .await
    }
}

/// Decoded `(id, created_at, price)` rows inside `window`.
///
/// SQL narrows by text comparison, which is exact for the canonical storage format;
/// [`decode_ts`] rejects every other spelling, and membership is re-checked on the
/// decoded instant.
fn load_in_window(
    conn: &mut SqliteConnection,
    window: Window,
) -> StoreResult<Vec<(String, DateTime<Utc>, Decimal)>> {
    let hi = tz::to_rfc3339_millis(window.end);
    let mut q = o::orders
        .select((o::id, o::created_at, o::price))
        .filter(o::created_at.le(hi))
        .into_boxed();
    if let Some(start) = window.start {
        q = q.filter(o::created_at.ge(tz::to_rfc3339_millis(start)));
    }
    let rows: Vec<(String, String, String)> = q.load(conn)?;
    let mut out = Vec::with_capacity(rows.len());
    for (id, created, price) in rows {
        let created_at = decode_ts(&id, &created)?;
        let price = decode_price(&id, &price)?;
        if window.contains(created_at) {
            out.push((id, created_at, price));
        }
    }
    Ok(out)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn window_totals(&self, window: Window) -> StoreResult<Totals> {
        self.with_conn(move |conn| {
            let rows = load_in_window(conn, window)?;
            Ok(Totals::from_prices(rows.into_iter().map(|(_, _, price)| price))?)
        })
        .await
    }

    async fn status_groups(&self) -> StoreResult<Vec<StatusGroup>> {
        self.with_conn(|conn| {
            let rows: Vec<(String, String, String, String)> = o::orders
                .select((o::id, o::status, o::price, o::created_at))
                .order((o::created_at.asc(), o::id.asc()))
                .load(conn)?;
            // every row is decoded here, so a malformed timestamp anywhere fails the dashboard
            let decoded = rows
                .iter()
                .map(|(id, status, price, created)| -> StoreResult<_> {
                    decode_ts(id, created)?;
                    Ok((id.as_str(), status.as_str(), decode_price(id, price)?))
                })
                .collect::<StoreResult<Vec<_>>>()?;
            group_by_status(decoded)
        })
        .await
    }

    async fn daily_groups(&self, window: Window, zone: Tz) -> StoreResult<Vec<DayGroup>> {
        self.with_conn(move |conn| {
            let rows = load_in_window(conn, window)?;
            group_by_local_day(
                rows.into_iter().map(|(_, created_at, price)| (created_at, price)),
                window,
                zone,
            )
        })
        .await
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<RecentOrder>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let rows: Vec<OrderRow> = o::orders
                .order((o::created_at.desc(), o::id.desc()))
                .limit(limit)
                .select(OrderRow::as_select())
                .load(conn)?;
            rows.into_iter().map(OrderRow::into_recent).collect()
        })
        .await
    }
}
