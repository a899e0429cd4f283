//! Errors surfaced by the reporting API.

use thiserror::Error;

use crate::{clock::ClockError, record::SumOverflow, store::StoreError, tz::TzError};

/// The unified error type for dashboard computations.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A record carries a status outside the known vocabulary.
    ///
    /// Fatal for the computation: dropping the record would silently corrupt
    /// the financial totals.
    #[error("order {id} has unclassified status {status:?}")]
    DataIntegrity {
        /// Offending record id.
        id: String,
        /// The raw label as stored.
        status: String,
    },

    /// The record store failed; see [`StatsError::is_retryable`].
    #[error("record store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// A revenue or cash sum exceeds the range of `Decimal`.
    ///
    /// Deterministic for the stored data, so never retryable.
    #[error("money sum out of range")]
    Overflow(#[from] SumOverflow),

    /// The clock could not produce `now`, or a local calendar boundary could not be resolved.
    #[error("clock error: {0}")]
    Clock(String),
}

impl StatsError {
    /// Whether the caller may retry the same computation.
    pub fn is_retryable(&self) -> bool {
        match self {
            StatsError::StoreUnavailable(e) => e.is_retryable(),
            StatsError::DataIntegrity { .. } | StatsError::Overflow(_) | StatsError::Clock(_) => {
                false
            }
        }
    }
}

impl From<StoreError> for StatsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Overflow(o) => StatsError::Overflow(o),
            other => StatsError::StoreUnavailable(other),
        }
    }
}

impl From<ClockError> for StatsError {
    fn from(e: ClockError) -> Self {
        StatsError::Clock(e.to_string())
    }
}

impl From<TzError> for StatsError {
    fn from(e: TzError) -> Self {
        StatsError::Clock(e.to_string())
    }
}
