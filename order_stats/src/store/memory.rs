//! In-memory record store over an immutable snapshot.

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::{
    record::{DayGroup, OrderRecord, RecentOrder, StatusGroup, Totals},
    store::{RecordStore, StoreResult, group_by_local_day, group_by_status},
    window::Window,
};

/// A fixed set of orders held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<OrderRecord>,
}

impl MemoryStore {
    /// Wrap a snapshot.
    pub fn new(records: Vec<OrderRecord>) -> Self {
        Self { records }
    }

    /// The snapshot, in insertion order.
    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }
}

impl FromIterator<OrderRecord> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = OrderRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn window_totals(&self, window: Window) -> StoreResult<Totals> {
        Ok(Totals::from_prices(
            self.records
                .iter()
                .filter(|r| window.contains(r.created_at))
                .map(|r| r.price),
        )?)
    }

    async fn status_groups(&self) -> StoreResult<Vec<StatusGroup>> {
        group_by_status(
            self.records
                .iter()
                .map(|r| (r.id.as_str(), r.status.as_str(), r.price)),
        )
    }

    async fn daily_groups(&self, window: Window, tz: Tz) -> StoreResult<Vec<DayGroup>> {
        group_by_local_day(
            self.records.iter().map(|r| (r.created_at, r.price)),
            window,
            tz,
        )
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<RecentOrder>> {
        let mut newest: Vec<&OrderRecord> = self.records.iter().collect();
        // ties broken by id so the list is stable across calls
        newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(newest.into_iter().take(limit).map(RecentOrder::from).collect())
    }
}
