//! Order analytics for a cash-on-delivery shop.
//!
//! Given timestamped, priced orders whose status changes over their lifetime, the
//! crate computes the dashboard figures: per-window totals (today, yesterday, this
//! week, this month, all time), cash totals per status category, the delivery rate,
//! and a zero-filled seven-day series. Every calendar boundary is a local midnight
//! in one configured zone.
//!
//! Entry point: [`engine::DashboardEngine::compute_dashboard_stats`], over any
//! [`store::RecordStore`] (SQLite via Diesel, or an in-memory snapshot).

#![deny(missing_docs)]

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod rate;
pub mod record;
#[allow(missing_docs)]
pub mod schema;
pub mod series;
pub mod status;
pub mod store;
pub mod tz;
pub mod window;

pub use engine::{DashboardEngine, DashboardStats};
pub use error::StatsError;
