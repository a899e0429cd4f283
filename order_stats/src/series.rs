//! Gap-filled daily series for the trailing week.
//!
//! The store only reports days that have orders; the chart needs every day, so
//! missing dates are filled with zeros here. The output always has one point per
//! date passed in, in the same order.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::record::DayGroup;

/// One day of the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Orders created that day.
    pub order_count: u64,
    /// Their revenue.
    pub revenue_sum: Decimal,
}

impl SeriesPoint {
    fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            order_count: 0,
            revenue_sum: Decimal::ZERO,
        }
    }
}

/// Lay `groups` over `dates`, zero-filling the gaps.
///
/// Groups for dates not listed are ignored.
pub fn build_series(dates: &[NaiveDate], groups: &[DayGroup]) -> Vec<SeriesPoint> {
    let by_date: HashMap<NaiveDate, &DayGroup> = groups.iter().map(|g| (g.date, g)).collect();
    dates
        .iter()
        .map(|&date| match by_date.get(&date) {
            Some(g) => SeriesPoint {
                date,
                order_count: g.totals.count,
                revenue_sum: g.totals.revenue_sum,
            },
            None => SeriesPoint::zero(date),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Totals;
    use chrono::Days;

    fn week_ending(d: NaiveDate) -> Vec<NaiveDate> {
        (d - Days::new(6)).iter_days().take(7).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_is_seven_zeros() {
        let dates = week_ending(day(2024, 3, 12));
        let s = build_series(&dates, &[]);
        assert_eq!(s.len(), 7);
        assert_eq!(s[0].date, day(2024, 3, 6));
        assert!(s.iter().all(|p| p.order_count == 0 && p.revenue_sum.is_zero()));
    }

    #[test]
    fn single_busy_day_keeps_the_others_at_zero() {
        let dates = week_ending(day(2024, 3, 12));
        let groups = [DayGroup {
            date: day(2024, 3, 10),
            totals: Totals {
                count: 2,
                revenue_sum: Decimal::new(13050, 2),
            },
        }];
        let s = build_series(&dates, &groups);
        assert_eq!(s.iter().filter(|p| p.order_count > 0).count(), 1);
        assert_eq!(s[4].order_count, 2);
        insta::assert_json_snapshot!(s[4], @r#"
        {
          "date": "2024-03-10",
          "order_count": 2,
          "revenue_sum": "130.50"
        }
        "#);
    }

    #[test]
    fn groups_outside_the_dates_are_ignored() {
        let dates = week_ending(day(2024, 3, 12));
        let groups = [DayGroup {
            date: day(2024, 3, 1),
            totals: Totals {
                count: 9,
                revenue_sum: Decimal::from(9),
            },
        }];
        assert!(build_series(&dates, &groups).iter().all(|p| p.order_count == 0));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn always_one_point_per_date_with_matching_totals(
            offset in 0u64..20_000,
            hits in proptest::collection::btree_map(0u64..7, (1u64..50, 0i64..100_000), 0..7),
        ) {
            let today = day(1990, 1, 1) + Days::new(offset);
            let dates = week_ending(today);
            let groups: Vec<DayGroup> = hits
                .iter()
                .map(|(&back, &(count, cents))| DayGroup {
                    date: today - Days::new(back),
                    totals: Totals { count, revenue_sum: Decimal::new(cents, 2) },
                })
                .collect();

            let s = build_series(&dates, &groups);
            prop_assert_eq!(s.len(), 7);
            prop_assert_eq!(s[6].date, today);
            prop_assert!(s.windows(2).all(|w| w[0].date.succ_opt() == Some(w[1].date)));

            let count: u64 = s.iter().map(|p| p.order_count).sum();
            let revenue: Decimal = s.iter().map(|p| p.revenue_sum).sum();
            prop_assert_eq!(count, groups.iter().map(|g| g.totals.count).sum::<u64>());
            prop_assert_eq!(revenue, groups.iter().map(|g| g.totals.revenue_sum).sum::<Decimal>());
        }
    }
}
