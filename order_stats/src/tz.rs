//! Time zone parsing and local-calendar helpers.
//!
//! What this module provides:
//! - [`parse_tz`]: Parse an IANA zone name (e.g., "Africa/Tunis").
//! - [`parse_ts_to_utc`]: Parse RFC-3339 timestamps with an explicit offset and convert to UTC.
//! - [`from_local_naive_with_policy`]: Convert a naive local timestamp to UTC, with a
//!   [`DstPolicy`] deciding what happens in DST gaps and overlaps.
//! - [`local_midnight`] / [`local_date`]: the two primitives every window is built from.
//!
//! Notes:
//! - Ambiguous local times happen during "fall back" when a wall time occurs twice.
//! - Nonexistent local times happen during "spring forward" when a wall time is skipped.
//!   A handful of zones move their clocks at midnight, so "midnight" itself can be
//!   ambiguous or missing; [`local_midnight`] always resolves it with [`DstPolicy::Lenient`].
//! - All stored timestamps are RFC-3339 UTC strings with millisecond precision. Local times
//!   only exist while computing calendar boundaries.
//!
//! Examples
//! - RFC-3339 with offset to UTC:
//!   "2024-03-10T09:30:00-05:00" -> "2024-03-10T14:30:00Z"
//! - São Paulo 2018-11-04 skipped 00:00..01:00, so that day's midnight resolves to 01:00 local.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Failures while interpreting zone names, timestamps or local wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TzError {
    /// Not an IANA zone name known to `chrono-tz`.
    #[error("bad tz: {0}")]
    UnknownZone(String),
    /// Not an RFC-3339 timestamp.
    #[error("bad rfc3339: {0}")]
    BadTimestamp(String),
    /// The wall time occurs twice and the policy does not pick one.
    #[error("ambiguous local time {0} in {1}")]
    Ambiguous(NaiveDateTime, Tz),
    /// The wall time was skipped and the policy could not find a later valid instant.
    #[error("nonexistent local time {0} in {1}")]
    Nonexistent(NaiveDateTime, Tz),
    /// Calendar arithmetic from this date leaves chrono's supported range.
    #[error("date out of range near {0}")]
    OutOfRange(NaiveDate),
}

/// Parse an IANA time zone name.
pub fn parse_tz(name: &str) -> Result<Tz, TzError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TzError::UnknownZone(name.to_string()))
}

/// RFC-3339 with offset -> UTC.
///
/// Example:
/// - "2024-03-10T09:30:00-05:00" -> "2024-03-10T14:30:00Z"
pub fn parse_ts_to_utc(s: &str) -> Result<DateTime<Utc>, TzError> {
    let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|_| TzError::BadTimestamp(s.to_string()))?;
    Ok(dt.with_timezone(&Utc))
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// Ambiguous -> earliest instant; nonexistent -> step forward in one-minute
    /// increments until the first valid instant (capped at 2 hours).
    Lenient,
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone and DST policy.
///
/// Errors:
/// - [`TzError::Ambiguous`] / [`TzError::Nonexistent`] under [`DstPolicy::Strict`]
/// - [`TzError::Nonexistent`] under [`DstPolicy::Lenient`] if no valid instant exists
///   within two hours after `naive`
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TzError> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(earliest, _) => match policy {
            DstPolicy::Lenient => Ok(earliest.with_timezone(&Utc)),
            DstPolicy::Strict => Err(TzError::Ambiguous(naive, tz)),
        },
        None => match policy {
            DstPolicy::Lenient => {
                let mut t = naive;
                for _ in 0..120 {
                    t += chrono::Duration::minutes(1);
                    match tz.from_local_datetime(&t) {
                        Single(dt) | Ambiguous(dt, _) => return Ok(dt.with_timezone(&Utc)),
                        None => continue,
                    }
                }
                Err(TzError::Nonexistent(naive, tz))
            }
            DstPolicy::Strict => Err(TzError::Nonexistent(naive, tz)),
        },
    }
}

/// First instant of `date` in `tz`.
///
/// Usually 00:00 local; when a DST change removes or repeats midnight this is the
/// first valid (earliest) instant of that calendar day.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, TzError> {
    from_local_naive_with_policy(date.and_time(NaiveTime::MIN), tz, DstPolicy::Lenient)
}

/// Calendar date of a UTC instant as seen in `tz`.
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
///
/// This is the storage format: fixed width with a `Z` suffix, so lexicographic order
/// equals chronological order.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
