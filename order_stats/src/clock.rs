//! Injectable source of "now".
//!
//! The engine itself only ever takes `now` as an argument; a [`Clock`] is how
//! callers (the CLI, tests) decide where that value comes from.

use chrono::{DateTime, Utc};

/// A clock that could not produce a reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("clock unavailable: {0}")]
pub struct ClockError(pub String);

/// Supplies the reference instant for a computation.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Result<DateTime<Utc>, ClockError>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>, ClockError> {
        Ok(Utc::now())
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> Result<DateTime<Utc>, ClockError> {
        Ok(self.0)
    }
}
