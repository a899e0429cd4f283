//! The reporting entrypoint.
//!
//! [`DashboardEngine::compute_dashboard_stats`] resolves every window for one `now`,
//! issues the store reads concurrently, and merges them once all have completed. A
//! failed read fails the whole call; a partial result is never returned.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    aggregate::{self, CategoryBreakdown, CategoryTotals},
    clock::Clock,
    error::StatsError,
    rate::delivery_rate,
    record::{RecentOrder, Totals},
    series::{SeriesPoint, build_series},
    window,
};

/// Default length of [`DashboardStats::recent_orders`].
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Everything the dashboard shows, computed for one `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Reference instant every window was computed from.
    pub now: DateTime<Utc>,
    /// Zone whose midnights define the windows.
    pub time_zone: Tz,
    /// Since local midnight.
    pub today: Totals,
    /// The previous local calendar day.
    pub yesterday: Totals,
    /// Since Monday local midnight.
    pub week: Totals,
    /// Since the 1st of the month.
    pub month: Totals,
    /// All orders created up to `now`.
    pub total: Totals,
    /// Delivered / paid.
    pub collected: CategoryTotals,
    /// Still in flight.
    pub pending: CategoryTotals,
    /// Returned / cancelled / refused.
    pub lost: CategoryTotals,
    /// Percentage of finished orders that were delivered, 0..=100.
    pub delivery_rate: f64,
    /// Seven daily points ending today, oldest first.
    pub series: Vec<SeriesPoint>,
    /// Newest orders, newest first.
    pub recent_orders: Vec<RecentOrder>,
}

/// Computes [`DashboardStats`] from a [`RecordStore`](crate::store::RecordStore) in one zone.
#[derive(Debug, Clone)]
pub struct DashboardEngine<S> {
    store: S,
    tz: Tz,
    recent_limit: usize,
}

impl<S> DashboardEngine<S>
where
    S: crate::store::RecordStore,
{
    /// Bind an engine to `store`, with calendar boundaries taken in `tz`.
    pub fn new(store: S, tz: Tz) -> Self {
        Self {
            store,
            tz,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// Change how many rows [`DashboardStats::recent_orders`] carries.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configured zone.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Compute every dashboard figure relative to `now`.
    ///
    /// # Errors
    /// - [`StatsError::DataIntegrity`] if any stored status is outside the vocabulary.
    /// - [`StatsError::StoreUnavailable`] if any store read fails.
    /// - [`StatsError::Overflow`] if a money sum leaves the `Decimal` range.
    /// - [`StatsError::Clock`] if a local midnight cannot be resolved.
    pub async fn compute_dashboard_stats(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, StatsError> {
        let windows = window::resolve(now, self.tz)?;

        tracing::debug!(%now, tz = %self.tz, recent_limit = self.recent_limit, "querying record store");
        let (windowed, groups, days, recent_orders) = tokio::try_join!(
            aggregate::window_totals(&self.store, &windows),
            self.store.status_groups(),
            self.store.daily_groups(windows.trailing, self.tz),
            self.store.recent(self.recent_limit),
        )?;

        let categories: CategoryBreakdown = aggregate::categorize(&groups)?;
        if categories.order_count() != windowed.total.count {
            tracing::warn!(
                %now,
                categorized = categories.order_count(),
                total = windowed.total.count,
                "orders dated after now are counted by category but not in the total window"
            );
        }

        let rate = delivery_rate(
            categories.collected.order_count,
            categories.lost.order_count,
        );
        let series = build_series(&windows.series_dates(), &days);

        Ok(DashboardStats {
            now,
            time_zone: self.tz,
            today: windowed.today,
            yesterday: windowed.yesterday,
            week: windowed.week,
            month: windowed.month,
            total: windowed.total,
            collected: categories.collected,
            pending: categories.pending,
            lost: categories.lost,
            delivery_rate: rate,
            series,
            recent_orders,
        })
    }

    /// [`Self::compute_dashboard_stats`] with `now` read from `clock`.
    pub async fn compute_with_clock(
        &self,
        clock: &dyn Clock,
    ) -> Result<DashboardStats, StatsError> {
        let now = clock.now()?;
        self.compute_dashboard_stats(now).await
    }
}
