//! Per-window and per-category aggregation.
//!
//! Window totals come straight from the store (one read per window, all issued at
//! once). Category totals are folded here from the store's per-label groups, because
//! classification is the engine's job: a label the vocabulary does not know aborts
//! the whole computation instead of quietly falling out of the cash figures.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::StatsError,
    record::{StatusGroup, Totals, checked_sum},
    status::{StatusCategory, StatusCategory::*},
    store::{RecordStore, StoreResult},
    window::Windows,
};

/// Count and revenue for each reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowTotals {
    /// Since local midnight.
    pub today: Totals,
    /// The previous local calendar day.
    pub yesterday: Totals,
    /// Since Monday local midnight.
    pub week: Totals,
    /// Since the 1st of the month, local midnight.
    pub month: Totals,
    /// Everything created up to `now`.
    pub total: Totals,
}

/// Cash and order count of one [`StatusCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    /// Sum of prices.
    pub cash_sum: Decimal,
    /// Number of orders.
    pub order_count: u64,
}

/// Cash flow split by category, over all orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// Delivered / paid.
    pub collected: CategoryTotals,
    /// Pending / shipped.
    pub pending: CategoryTotals,
    /// Returned / cancelled / refused.
    pub lost: CategoryTotals,
}

impl CategoryBreakdown {
    /// Totals for one category.
    pub fn get(&self, category: StatusCategory) -> &CategoryTotals {
        match category {
            Collected => &self.collected,
            Pending => &self.pending,
            Lost => &self.lost,
        }
    }

    fn get_mut(&mut self, category: StatusCategory) -> &mut CategoryTotals {
        match category {
            Collected => &mut self.collected,
            Pending => &mut self.pending,
            Lost => &mut self.lost,
        }
    }

    /// Orders across all three categories.
    pub fn order_count(&self) -> u64 {
        self.collected.order_count + self.pending.order_count + self.lost.order_count
    }
}

/// Fetch the five window totals concurrently.
pub async fn window_totals<S>(store: &S, windows: &Windows) -> StoreResult<WindowTotals>
where
    S: RecordStore + ?Sized,
{
    let (today, yesterday, week, month, total) = tokio::try_join!(
        store.window_totals(windows.today),
        store.window_totals(windows.yesterday),
        store.window_totals(windows.week),
        store.window_totals(windows.month),
        store.window_totals(windows.total),
    )?;
    Ok(WindowTotals {
        today,
        yesterday,
        week,
        month,
        total,
    })
}

/// Fold per-label groups into the three categories.
///
/// Errors with [`StatsError::DataIntegrity`] on the first label outside the vocabulary,
/// naming one record that carries it.
pub fn categorize(groups: &[StatusGroup]) -> Result<CategoryBreakdown, StatsError> {
    let mut out = CategoryBreakdown::default();
    for g in groups {
        let Some(category) = StatusCategory::of_label(&g.status) else {
            tracing::error!(
                id = %g.sample_id, status = %g.status, affected = g.count,
                "unclassified order status, aborting aggregation"
            );
            return Err(StatsError::DataIntegrity {
                id: g.sample_id.clone(),
                status: g.status.clone(),
            });
        };
        let slot = out.get_mut(category);
        slot.cash_sum = checked_sum(slot.cash_sum, g.cash_sum)?;
        slot.order_count += g.count;
    }
    Ok(out)
}
