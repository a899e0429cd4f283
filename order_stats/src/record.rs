//! The order shape the analytics engine reads, and the value types stores return.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order as seen by the engine.
///
/// `status` is the raw stored label; it is classified (and rejected if unknown)
/// by the aggregator, never by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Opaque unique identifier.
    pub id: String,
    /// Non-negative amount, exact decimal.
    pub price: Decimal,
    /// Raw status label (canonical or synonym).
    pub status: String,
    /// Creation instant; drives every window membership test.
    pub created_at: DateTime<Utc>,
    /// Last modification instant; informational only.
    pub updated_at: DateTime<Utc>,
}

/// Count and exact revenue over some subset of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Number of orders.
    pub count: u64,
    /// Sum of their prices.
    pub revenue_sum: Decimal,
}

/// A money sum left the range [`Decimal`] can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("decimal sum overflowed")]
pub struct SumOverflow;

/// `a + b`, or [`SumOverflow`].
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, SumOverflow> {
    a.checked_add(b).ok_or(SumOverflow)
}

impl Totals {
    /// Account for one more order.
    pub fn add(&mut self, price: Decimal) -> Result<(), SumOverflow> {
        self.revenue_sum = checked_sum(self.revenue_sum, price)?;
        self.count += 1;
        Ok(())
    }

    /// Fold an iterator of prices.
    pub fn from_prices(prices: impl IntoIterator<Item = Decimal>) -> Result<Self, SumOverflow> {
        let mut t = Totals::default();
        for p in prices {
            t.add(p)?;
        }
        Ok(t)
    }
}

/// Orders sharing one raw status label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGroup {
    /// Raw label exactly as stored.
    pub status: String,
    /// Number of orders carrying it.
    pub count: u64,
    /// Sum of their prices.
    pub cash_sum: Decimal,
    /// Id of one order with this label, for error reporting.
    pub sample_id: String,
}

/// Orders created on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Count and revenue of that day.
    pub totals: Totals,
}

/// Display row for the "latest orders" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentOrder {
    /// Order id.
    pub id: String,
    /// Raw status label.
    pub status: String,
    /// Price.
    pub price: Decimal,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl From<&OrderRecord> for RecentOrder {
    fn from(r: &OrderRecord) -> Self {
        Self {
            id: r.id.clone(),
            status: r.status.clone(),
            price: r.price,
            created_at: r.created_at,
        }
    }
}
