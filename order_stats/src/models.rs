//! Diesel models mapping to the database schema.
//!
//! These types mirror the `orders` table defined in the embedded migrations and in
//! [`crate::schema`]. Rows hold text exactly as stored; converting to the engine's
//! [`OrderRecord`] is where timestamps and prices are decoded and validated.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    record::{OrderRecord, RecentOrder},
    schema::orders,
    status::OrderStatus,
    store::StoreError,
    tz,
};

/// A row in [`crate::schema::orders`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = orders, check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderRow {
    /// Primary key.
    pub id: String,
    /// Decimal string, e.g. "129.500".
    pub price: String,
    /// Raw status label.
    pub status: String,
    /// RFC3339 UTC, millisecond precision.
    pub created_at: String,
    /// RFC3339 UTC, millisecond precision.
    pub updated_at: String,
}

impl OrderRow {
    /// Decode into the engine's record type.
    pub fn into_record(self) -> Result<OrderRecord, StoreError> {
        let price = decode_price(&self.id, &self.price)?;
        let created_at = decode_ts(&self.id, &self.created_at)?;
        let updated_at = decode_ts(&self.id, &self.updated_at)?;
        Ok(OrderRecord {
            id: self.id,
            price,
            status: self.status,
            created_at,
            updated_at,
        })
    }

    /// Decode into a display row.
    pub fn into_recent(self) -> Result<RecentOrder, StoreError> {
        self.into_record().map(|r| RecentOrder::from(&r))
    }
}

/// Insertable form of [`OrderRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    /// Primary key.
    pub id: &'a str,
    /// Decimal string.
    pub price: &'a str,
    /// Canonical status label.
    pub status: &'a str,
    /// RFC3339 UTC.
    pub created_at: &'a str,
    /// RFC3339 UTC; equal to `created_at` on insert.
    pub updated_at: &'a str,
}

/// An order to be written through the store adapter.
///
/// Also the line format of `order-stats import` (one JSON object per line).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOrder {
    /// Caller-chosen unique id.
    pub id: String,
    /// Non-negative price.
    pub price: Decimal,
    /// Initial status label; a new order starts as `Pending`.
    #[serde(default)]
    pub status: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Check the order and resolve its status to the canonical label that gets stored.
    pub fn validate(&self) -> Result<OrderStatus, StoreError> {
        if self.id.trim().is_empty() {
            return Err(StoreError::Invalid("order id cannot be empty".into()));
        }
        if self.price < Decimal::ZERO {
            return Err(StoreError::Invalid(format!(
                "order {}: price must be non-negative, got {}",
                self.id, self.price
            )));
        }
        match &self.status {
            None => Ok(OrderStatus::Pending),
            Some(label) => OrderStatus::from_str(label)
                .map_err(|e| StoreError::Invalid(format!("order {}: {e}", self.id))),
        }
    }

    /// Validate and convert to the record a store would return after insertion.
    pub fn into_record(self) -> Result<OrderRecord, StoreError> {
        let status = self.validate()?;
        Ok(OrderRecord {
            id: self.id,
            price: self.price,
            status: status.as_str().to_string(),
            created_at: self.created_at,
            updated_at: self.created_at,
        })
    }
}

pub(crate) fn decode_price(id: &str, text: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(text.trim()).map_err(|e| StoreError::CorruptRow {
        id: id.to_string(),
        reason: format!("price {text:?}: {e}"),
    })
}

/// Decode a stored timestamp. Only the exact storage format is accepted, since range
/// filters compare the raw text.
pub(crate) fn decode_ts(id: &str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    let corrupt = |reason: String| StoreError::CorruptRow {
        id: id.to_string(),
        reason,
    };
    let ts = tz::parse_ts_to_utc(text).map_err(|e| corrupt(e.to_string()))?;
    if tz::to_rfc3339_millis(ts) != text {
        return Err(corrupt(format!(
            "timestamp {text:?} is not in storage format (expected {:?})",
            tz::to_rfc3339_millis(ts)
        )));
    }
    Ok(ts)
}
