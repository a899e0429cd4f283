//! Calendar window boundaries relative to an injected `now`.
//!
//! - All windows are closed intervals: both bounds are inclusive.
//! - "Midnight" is local midnight in one configured zone, resolved by [`crate::tz::local_midnight`].
//! - Day arithmetic is calendar arithmetic on local dates, never multiples of 24h, so
//!   23h and 25h DST days land on the right midnight.
//! - Week: ISO weekday (Monday = 1 .. Sunday = 7), Monday 00:00 local.
//! - Month: the 1st of the local month, 00:00 local.
//!
//! Nothing here reads a clock.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::tz::{self, TzError};

/// Number of calendar days covered by the trailing series, today included.
pub const SERIES_DAYS: u64 = 7;

/// A closed interval `[start, end]`; `start == None` means unbounded below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    /// Inclusive lower bound; `None` for all-time.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
}

impl Window {
    /// `[start, end]`
    pub const fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end,
        }
    }

    /// `(-inf, end]`
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self { start: None, end }
    }

    /// Inclusive membership test.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| ts >= s) && ts <= self.end
    }
}

/// Every window the dashboard reports on, for one `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Windows {
    /// `[midnight(today), now]`
    pub today: Window,
    /// `[midnight(yesterday), midnight(today) - 1ms]`
    pub yesterday: Window,
    /// `[Monday midnight, now]`
    pub week: Window,
    /// `[1st-of-month midnight, now]`
    pub month: Window,
    /// `(-inf, now]`
    pub total: Window,
    /// `[midnight(today - 6d), now]`
    pub trailing: Window,
    /// Local calendar date of `now`.
    pub today_date: NaiveDate,
    /// First date of the trailing series.
    pub series_start: NaiveDate,
    /// Zone every boundary was computed in.
    pub tz: Tz,
}

impl Windows {
    /// The [`SERIES_DAYS`] local dates covered by the trailing window, oldest first.
    pub fn series_dates(&self) -> Vec<NaiveDate> {
        self.series_start
            .iter_days()
            .take(SERIES_DAYS as usize)
            .collect()
    }
}

/// Compute all window boundaries for `now` in `tz`.
///
/// Errors when a local midnight cannot be resolved (see [`tz::local_midnight`]) or when
/// `now` sits so close to chrono's date limits that a boundary date does not exist.
pub fn resolve(now: DateTime<Utc>, tz: Tz) -> Result<Windows, TzError> {
    let today = tz::local_date(now, tz);

    let today_start = tz::local_midnight(today, tz)?;
    let yesterday_start = tz::local_midnight(days_before(today, 1)?, tz)?;

    let iso_day = today.weekday().number_from_monday(); // 1 = Mon .. 7 = Sun
    let week_start = tz::local_midnight(days_before(today, u64::from(iso_day - 1))?, tz)?;

    let first_of_month = today.with_day(1).ok_or(TzError::OutOfRange(today))?;
    let month_start = tz::local_midnight(first_of_month, tz)?;

    let series_start = days_before(today, SERIES_DAYS - 1)?;
    let trailing_start = tz::local_midnight(series_start, tz)?;

    let windows = Windows {
        today: Window::closed(today_start, now),
        yesterday: Window::closed(yesterday_start, today_start - Duration::milliseconds(1)),
        week: Window::closed(week_start, now),
        month: Window::closed(month_start, now),
        total: Window::until(now),
        trailing: Window::closed(trailing_start, now),
        today_date: today,
        series_start,
        tz,
    };
    tracing::debug!(
        %now, %tz, today = %today, week_start = %week_start, month_start = %month_start,
        "resolved dashboard windows"
    );
    Ok(windows)
}

fn days_before(date: NaiveDate, n: u64) -> Result<NaiveDate, TzError> {
    date.checked_sub_days(Days::new(n))
        .ok_or(TzError::OutOfRange(date))
}
